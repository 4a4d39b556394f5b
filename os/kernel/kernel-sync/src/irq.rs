//! Interrupt masking for locks shared with interrupt handlers.
//!
//! The MCS lock never touches the interrupt flag itself. A lock that is
//! also taken from an interrupt handler must be acquired through
//! [`McsLock::with_lock_irq`], otherwise a handler interrupting the holder
//! on the same core queues behind it forever.
//!
//! # Platform / Privilege
//!
//! Uses `cli/sti` and `pushfq/pop`; requires `x86_64` and ring 0.

use crate::McsLock;

/// `IF`, bit 9 of `RFLAGS`.
const RFLAGS_IF: u64 = 1 << 9;

#[inline]
fn cli() {
    unsafe { core::arch::asm!("cli", options(nomem, nostack, preserves_flags)) }
}

#[inline]
fn sti() {
    unsafe { core::arch::asm!("sti", options(nomem, nostack, preserves_flags)) }
}

/// Returns the current `RFLAGS` value (via `pushfq/pop`).
#[inline]
#[must_use]
pub fn rflags() -> u64 {
    let r: u64;
    unsafe { core::arch::asm!("pushfq; pop {}", out(reg) r, options(nostack, preserves_flags)) }
    r
}

/// Whether maskable interrupts are currently enabled on this core.
#[inline]
#[must_use]
pub fn interrupts_enabled() -> bool {
    rflags() & RFLAGS_IF != 0
}

/// Masks interrupts on creation and restores the previous state on drop.
///
/// Nesting is fine: an inner guard created with interrupts already masked
/// leaves them masked when it drops.
///
/// ```no_run
/// use kernel_sync::irq::{IrqGuard, interrupts_enabled};
///
/// {
///     let _g = IrqGuard::new();
///     assert!(!interrupts_enabled());
/// }
/// ```
pub struct IrqGuard {
    were_enabled: bool,
}

impl Default for IrqGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqGuard {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        let were_enabled = interrupts_enabled();
        if were_enabled {
            cli();
        }
        Self { were_enabled }
    }
}

impl Drop for IrqGuard {
    fn drop(&mut self) {
        if self.were_enabled {
            sti();
        }
    }
}

impl<T> McsLock<T> {
    /// [`with_lock`](Self::with_lock) with interrupts masked for the whole
    /// critical section. The lock is released before interrupts come back.
    #[inline]
    pub fn with_lock_irq<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _irq = IrqGuard::new();
        self.with_lock(f)
    }
}
