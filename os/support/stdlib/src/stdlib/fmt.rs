use crate::syscall::sys::debug_write_byte;
use core::fmt::{self, Write};

/// Writes formatted output to the kernel debug console, byte by byte.
pub struct SyscallSink;

impl Write for SyscallSink {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            debug_write_byte(b).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

#[doc(hidden)]
#[inline]
pub fn syscall_write(args: fmt::Arguments) {
    // Ignore errors; this is best-effort debug output.
    fmt::write(&mut SyscallSink, args).ok();
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {{
        $crate::stdlib::fmt::syscall_write(core::format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => {{
        $crate::stdlib::fmt::syscall_write(core::format_args!($($arg)*));
        $crate::stdlib::fmt::syscall_write(core::format_args!("\n"));
    }};
}
