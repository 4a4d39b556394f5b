//! # User/kernel shared ABI
//!
//! * [`status`]: the 64-bit status word returned by syscalls and carried in
//!   protocol `status` messages.
//! * [`syscall_abi`]: the syscall table and the kernel-side dispatcher.
//! * [`syscall`]: user-side stubs generated from the same table.
//! * [`proto`]: IPC protocol tags and the base `status`/`get_proto_id`
//!   reservation.
//! * `stdlib`: `print!`/`println!` for user programs.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(feature = "syscall"), forbid(unsafe_code))]
#![cfg_attr(feature = "syscall", allow(unsafe_code))]

pub mod status;

#[cfg(all(feature = "stdlib", target_arch = "x86_64"))]
#[macro_use]
pub mod stdlib;

#[cfg(feature = "syscall")]
pub mod syscall;

#[cfg(feature = "syscall-abi")]
pub mod syscall_abi;

#[cfg(feature = "proto")]
pub mod proto;

#[cfg(all(feature = "stdlib", target_arch = "x86_64"))]
pub use stdlib::*;

#[cfg(feature = "panic-handler")]
mod panic {
    #[panic_handler]
    fn panic(info: &core::panic::PanicInfo) -> ! {
        crate::println!("panic: {}", info.message());
        loop {
            core::hint::spin_loop();
        }
    }
}
