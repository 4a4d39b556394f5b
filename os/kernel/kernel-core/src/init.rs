//! Early init on the bootstrap core and the release of secondary cores.

use crate::boot::{BootSnapshot, SnapshotError};
use crate::state::KernelState;
use crate::syscall::{DebugSink, KernelSyscalls};
use core::hint::spin_loop;
use core::sync::atomic::{AtomicBool, Ordering};
use kernel_info::boot::BootInfo;
use kernel_sync::{McsLock, Once};
use log::{info, warn};

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("early init already ran")]
    AlreadyInitialized,
    #[error("no ACPI root pointer and the boot flags ask to halt on boot warnings")]
    NoAcpiRoot,
}

/// Held closed until the bootstrap core has published everything secondary
/// cores read. Opening it is the release edge for those writes.
#[derive(Debug, Default)]
pub struct CoreGate {
    open: AtomicBool,
}

impl CoreGate {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            open: AtomicBool::new(false),
        }
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Spins until [`CoreGate::open`] was called.
    pub fn wait(&self) {
        while !self.is_open() {
            spin_loop();
        }
    }
}

/// Kernel-wide early state. Meant to live in a `static`.
pub struct EarlyKernel {
    boot: Once<BootSnapshot>,
    state: McsLock<KernelState>,
    gate: CoreGate,
}

impl Default for EarlyKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl EarlyKernel {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            boot: Once::new(),
            state: McsLock::new(KernelState::new()),
            gate: CoreGate::new(),
        }
    }

    /// Runs on the bootstrap core before any other core starts.
    ///
    /// # Errors
    /// * [`InitError::AlreadyInitialized`] on a second call.
    /// * [`InitError::Snapshot`] if the boot data doesn't fit.
    /// * [`InitError::NoAcpiRoot`] if ACPI is missing and the panic flag is set.
    ///
    /// The gate stays closed on error.
    pub fn init(&self, info: &BootInfo<'_>) -> Result<&BootSnapshot, InitError> {
        if self.boot.get().is_some() {
            return Err(InitError::AlreadyInitialized);
        }

        let snapshot = BootSnapshot::capture(info)?;
        if snapshot.acpi_root() == 0 {
            if snapshot.flags().panic() {
                return Err(InitError::NoAcpiRoot);
            }
            warn!("Firmware provided no ACPI root pointer");
        }

        let boot = self
            .boot
            .publish(snapshot)
            .map_err(|_| InitError::AlreadyInitialized)?;

        self.state
            .with_lock(|state| state.log.push(b"kernel: early init complete\n"));
        info!(
            "Boot snapshot: {} memory regions, {} KiB usable, framebuffer {}",
            boot.memory_map().len(),
            boot.usable_bytes() / 1024,
            if boot.framebuffer().is_some() { "present" } else { "absent" },
        );

        self.gate.open();
        Ok(boot)
    }

    /// The boot snapshot, once [`EarlyKernel::init`] succeeded.
    #[must_use]
    pub fn boot(&self) -> Option<&BootSnapshot> {
        self.boot.get()
    }

    #[must_use]
    pub const fn state(&self) -> &McsLock<KernelState> {
        &self.state
    }

    #[must_use]
    pub const fn gate(&self) -> &CoreGate {
        &self.gate
    }

    /// Syscall handlers bound to this kernel, once init ran.
    pub fn syscalls<S: DebugSink>(&self, console: S) -> Option<KernelSyscalls<'_, S>> {
        let boot = self.boot.get()?;
        Some(KernelSyscalls::new(boot, &self.state, console))
    }

    /// Called by secondary cores: waits for the bootstrap core and returns
    /// the published snapshot.
    pub fn secondary_entry(&self) -> &BootSnapshot {
        self.gate.wait();
        loop {
            // The gate opens strictly after publication, so this returns on
            // the first pass.
            if let Some(boot) = self.boot.get() {
                return boot;
            }
            spin_loop();
        }
    }
}
