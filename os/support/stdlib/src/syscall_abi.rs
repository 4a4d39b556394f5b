//! The syscall table.
//!
//! [`for_each_syscall!`] is the only place syscalls are declared. This module
//! expands it into the number space ([`Sysno`], [`SYSCALLS`]) and the kernel
//! side ([`SyscallHandler`], [`dispatch`]); `syscall` expands the same table
//! into user-side stubs. A syscall's number is its position in the table, so
//! new entries go at the end.
//!
//! Arguments travel in `rdi, rsi, rdx, r10, r8, r9`, the number in `rax`, and
//! the result comes back in `rax` as a [`Status`] word.

pub use crate::status::{Error, Status};

/// Maximum number of register arguments.
pub const MAX_ARGS: usize = 6;

/// Invokes `$callback!` with every syscall as
/// `$(#[doc])* Variant = name(arg: Type, ...);`, in number order.
#[macro_export]
macro_rules! for_each_syscall {
    ($callback:ident) => {
        $callback! {
            /// Does nothing; measures the round trip.
            Noop = noop();

            /// Appends `len` bytes at `message` to the kernel log.
            Log = log(message: *const u8, len: usize);

            /// Writes one byte to the kernel's debug console.
            DebugWriteByte = debug_write_byte(byte: u8);

            /// Moves up to `len` bytes of the kernel log into `buffer` and
            /// returns how many were copied.
            GetLog = get_log(buffer: *mut u8, len: usize);

            /// Returns the boot flags the kernel was started with.
            BootFlags = boot_flags();

            /// Returns the number of memory regions the loader reported.
            MemoryRegionCount = memory_region_count();
        }
    };
}

/// Result of a syscall handler or stub.
pub type SyscallResult = Result<u64, Error>;

/// One row of the syscall table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SyscallEntry {
    pub sysno: Sysno,
    pub name: &'static str,
    pub params: &'static [Param],
}

/// A parameter as written in the table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Param {
    pub name: &'static str,
    /// Type tokens as `stringify!` renders them; spacing is not stable.
    pub ty: &'static str,
}

impl Param {
    /// Compares the recorded type against `written`, ignoring whitespace.
    #[must_use]
    pub fn has_type(&self, written: &str) -> bool {
        let recorded = self.ty.chars().filter(|c| !c.is_whitespace());
        let expected = written.chars().filter(|c| !c.is_whitespace());
        recorded.eq(expected)
    }
}

/// Conversion between typed syscall arguments and register values.
pub trait SyscallArg: Sized {
    fn from_raw(raw: u64) -> Self;
    fn into_raw(self) -> u64;
}

impl SyscallArg for u64 {
    fn from_raw(raw: u64) -> Self {
        raw
    }
    fn into_raw(self) -> u64 {
        self
    }
}

#[allow(clippy::cast_possible_truncation)]
impl SyscallArg for usize {
    fn from_raw(raw: u64) -> Self {
        raw as Self
    }
    fn into_raw(self) -> u64 {
        self as u64
    }
}

#[allow(clippy::cast_possible_truncation)]
impl SyscallArg for u32 {
    fn from_raw(raw: u64) -> Self {
        raw as Self
    }
    fn into_raw(self) -> u64 {
        u64::from(self)
    }
}

#[allow(clippy::cast_possible_truncation)]
impl SyscallArg for u8 {
    fn from_raw(raw: u64) -> Self {
        raw as Self
    }
    fn into_raw(self) -> u64 {
        u64::from(self)
    }
}

impl SyscallArg for bool {
    fn from_raw(raw: u64) -> Self {
        raw != 0
    }
    fn into_raw(self) -> u64 {
        u64::from(self)
    }
}

impl<T> SyscallArg for *const T {
    fn from_raw(raw: u64) -> Self {
        raw as usize as Self
    }
    fn into_raw(self) -> u64 {
        self as usize as u64
    }
}

impl<T> SyscallArg for *mut T {
    fn from_raw(raw: u64) -> Self {
        raw as usize as Self
    }
    fn into_raw(self) -> u64 {
        self as usize as u64
    }
}

macro_rules! define_abi {
    ($(
        $(#[$doc:meta])*
        $variant:ident = $name:ident ( $($arg:ident : $ty:ty),* $(,)? );
    )*) => {
        /// Syscall numbers.
        #[repr(u64)]
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
        pub enum Sysno {
            $( $(#[$doc])* $variant, )*
        }

        impl Sysno {
            /// Every syscall, indexed by number.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            pub const COUNT: usize = Self::ALL.len();

            #[must_use]
            pub const fn number(self) -> u64 {
                self as u64
            }

            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($name), )*
                }
            }

            /// # Errors
            /// [`Error::InvalidSyscall`] if `number` is past the end of the table.
            pub fn from_number(number: u64) -> Result<Self, Error> {
                usize::try_from(number)
                    .ok()
                    .and_then(|index| Self::ALL.get(index))
                    .copied()
                    .ok_or(Error::InvalidSyscall)
            }
        }

        /// The table in number order, with parameter names and types as written.
        pub static SYSCALLS: &[SyscallEntry] = &[$(
            SyscallEntry {
                sysno: Sysno::$variant,
                name: stringify!($name),
                params: &[$( Param { name: stringify!($arg), ty: stringify!($ty) } ),*],
            },
        )*];

        const _: () = {
            $( assert!(<[&str]>::len(&[$(stringify!($arg)),*]) <= MAX_ARGS); )*
        };

        /// Kernel-side implementation of the table, one method per syscall.
        pub trait SyscallHandler {
            $(
                $(#[$doc])*
                fn $name(&mut self $(, $arg: $ty)*) -> SyscallResult;
            )*
        }

        /// Routes a raw syscall to `handler` and encodes the result for `rax`.
        ///
        /// Numbers past the end of the table yield [`Error::InvalidSyscall`].
        pub fn dispatch<H: SyscallHandler + ?Sized>(
            handler: &mut H,
            number: u64,
            args: [u64; MAX_ARGS],
        ) -> u64 {
            let result = Sysno::from_number(number).and_then(|sysno| match sysno {
                $(
                    Sysno::$variant => {
                        #[allow(unused_mut, unused_variables)]
                        let mut args = args.into_iter();
                        handler.$name($( <$ty as SyscallArg>::from_raw(args.next().unwrap_or_default()) ),*)
                    }
                )*
            });
            Status::from_result(result).into_raw()
        }
    };
}

crate::for_each_syscall!(define_abi);
