pub mod fmt;

use crate::syscall::sys;

#[inline]
const fn hex_digit(n: u8) -> u8 {
    if n < 10 { b'0' + n } else { b'A' + (n - 10) }
}

/// Prints `x` as 16 hex digits on the debug console.
pub fn print_hex(mut x: u64) {
    for _ in 0..16 {
        x = x.rotate_left(4);
        #[allow(clippy::cast_possible_truncation)]
        let nib = (x as u8) & 0x0F;
        // Best effort, like every other debug console write.
        let _ = sys::debug_write_byte(hex_digit(nib));
    }
}

/// Appends `message` to the kernel log.
///
/// # Errors
/// Whatever the kernel reports for the `log` syscall.
pub fn log(message: &str) -> Result<(), crate::status::Error> {
    sys::log(message.as_ptr(), message.len()).map(|_| ())
}
