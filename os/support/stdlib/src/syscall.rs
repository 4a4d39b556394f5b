//! User-side syscall stubs, generated from the same table as the kernel
//! dispatcher.
//!
//! [`via`] holds one function per syscall that goes through any [`Trap`];
//! [`sys`] binds those to the `syscall` instruction.

use crate::syscall_abi::{MAX_ARGS, Status, SyscallArg, SyscallResult, Sysno};

/// A way of entering the kernel.
pub trait Trap {
    /// Issues syscall `number` with register arguments `args` and returns `rax`.
    fn trap(&self, number: u64, args: [u64; MAX_ARGS]) -> u64;

    /// Pads `args` to the register set, traps, and decodes the status word.
    fn invoke(&self, sysno: Sysno, args: &[u64]) -> SyscallResult {
        let mut regs = [0u64; MAX_ARGS];
        for (reg, arg) in regs.iter_mut().zip(args) {
            *reg = *arg;
        }
        Status::from_raw(self.trap(sysno.number(), regs)).into_result()
    }
}

impl<F> Trap for F
where
    F: Fn(u64, [u64; MAX_ARGS]) -> u64,
{
    fn trap(&self, number: u64, args: [u64; MAX_ARGS]) -> u64 {
        self(number, args)
    }
}

/// The `syscall` instruction.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Copy, Clone, Default)]
pub struct SyscallInstruction;

#[cfg(target_arch = "x86_64")]
impl Trap for SyscallInstruction {
    #[inline]
    fn trap(&self, number: u64, args: [u64; MAX_ARGS]) -> u64 {
        let ret: u64;
        unsafe {
            core::arch::asm!(
                "syscall",
                inlateout("rax") number => ret,
                in("rdi") args[0],
                in("rsi") args[1],
                in("rdx") args[2],
                in("r10") args[3],
                in("r8") args[4],
                in("r9") args[5],
                lateout("rcx") _, // clobbered by SYSCALL
                lateout("r11") _, // clobbered by SYSCALL
                options(nostack)
            );
        }
        ret
    }
}

macro_rules! define_stubs {
    ($(
        $(#[$doc:meta])*
        $variant:ident = $name:ident ( $($arg:ident : $ty:ty),* $(,)? );
    )*) => {
        /// Stubs over an arbitrary [`Trap`].
        pub mod via {
            use super::{Trap, SyscallArg, SyscallResult, Sysno};

            $(
                $(#[$doc])*
                #[inline]
                pub fn $name<T: Trap + ?Sized>(trap: &T $(, $arg: $ty)*) -> SyscallResult {
                    let args: &[u64] = &[$( SyscallArg::into_raw($arg) ),*];
                    trap.invoke(Sysno::$variant, args)
                }
            )*
        }

        /// Stubs over the `syscall` instruction.
        #[cfg(target_arch = "x86_64")]
        pub mod sys {
            use super::{SyscallInstruction, SyscallResult};

            $(
                $(#[$doc])*
                #[inline]
                pub fn $name($($arg: $ty),*) -> SyscallResult {
                    super::via::$name(&SyscallInstruction $(, $arg)*)
                }
            )*
        }
    };
}

crate::for_each_syscall!(define_stubs);
