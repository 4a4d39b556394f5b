//! # Kernel early state
//!
//! Everything between "the loader jumped to us" and "other cores may run"
//! that doesn't need ring 0 to be tested:
//!
//! 1. [`boot`]: copy what the kernel keeps out of loader memory.
//! 2. [`state`]: shared mutable kernel state behind an MCS lock.
//! 3. [`init`]: publish both, then open the gate for secondary cores.
//! 4. [`syscall`]: the handlers behind the syscall table.

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod boot;
pub mod init;
pub mod state;
pub mod syscall;

pub use boot::{BootSnapshot, SnapshotError};
pub use init::{CoreGate, EarlyKernel, InitError};
pub use state::{KernelState, LogRing};
pub use syscall::{DebugSink, KernelSyscalls};
