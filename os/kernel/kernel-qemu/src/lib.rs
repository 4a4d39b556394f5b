//! # QEMU Debug Console Output
//!
//! Early-boot and kernel diagnostics over QEMU's debug console port
//! (`0x402`, captured with `-debugcon stdio`).
//!
//! * [`qemu_trace!`]: raw `format_args!` output, usable before any logger
//!   exists and on fatal paths.
//! * [`QemuLogger`]: a `log::Log` backend writing one
//!   `"[LEVEL] target: message"` line per record. Lines from different cores
//!   are serialized with an MCS lock.
//!
//! With the `enabled` feature off every write compiles to nothing.
//!
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::{LevelFilter, info};
//!
//! QemuLogger::new(LevelFilter::Debug).init().ok();
//! info!("kernel entered");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::QemuLogger;

/// Writes one byte to the debug console.
#[inline]
pub fn debug_putc(byte: u8) {
    qemu_fmt::dbg_putc(byte);
}

#[cfg(feature = "enabled")]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// The port number for QEMU's debug port.
    const QEMU_DEBUG_PORT: u16 = 0x402;

    #[allow(clippy::inline_always)]
    #[inline(always)]
    pub fn dbg_putc(c: u8) {
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") QEMU_DEBUG_PORT,
                in("al") c,
                options(nomem, nostack, preserves_flags)
            );
        }
    }

    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            s.bytes().for_each(dbg_putc);
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline]
    pub fn qemu_write(args: fmt::Arguments) {
        // Best effort; the sink itself never fails.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

#[cfg(not(feature = "enabled"))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;

    #[inline]
    pub const fn dbg_putc(_: u8) {}

    #[doc(hidden)]
    #[inline]
    pub fn qemu_write(_: fmt::Arguments) {}
}

#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        // No allocation: `format_args!` builds a lightweight `Arguments`.
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
