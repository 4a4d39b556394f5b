//! # Kernel synchronization primitives
//!
//! * [`McsLock`]: FIFO queue spinlock; the only lock the kernel uses once
//!   more than one core runs.
//! * [`Once`]: write-once publication of read-only boot data.
//! * [`irq`]: interrupt masking around critical sections (`x86_64` only).

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(target_arch = "x86_64")]
pub mod irq;
mod mcs;
mod misuse;
mod once;

#[cfg(target_arch = "x86_64")]
pub use irq::IrqGuard;
pub use mcs::{McsGuard, McsLock, McsNode, RawMcs};
pub use misuse::{LockMisuse, set_context_id};
pub use once::Once;
