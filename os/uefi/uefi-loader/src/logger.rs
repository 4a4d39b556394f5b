use core::sync::atomic::{AtomicBool, Ordering};
use kernel_qemu::qemu_trace;
use kernel_sync::Once;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Mirrors log records to the QEMU debug port and, while boot services
/// exist, to the UEFI console.
pub struct UefiLogger {
    max_level: LevelFilter,
    boot_services_available: AtomicBool,
}

impl UefiLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self {
            max_level,
            boot_services_available: AtomicBool::new(true),
        }
    }

    /// Installs the logger. Call this once during early init.
    ///
    /// # Errors
    /// Fails if a logger was already installed.
    pub fn init(self) -> Result<&'static Self, SetLoggerError> {
        static LOGGER: Once<UefiLogger> = Once::new();

        let logger = LOGGER.get_or_init(|| self);
        log::set_logger(logger)?;
        log::set_max_level(logger.max_level);
        Ok(logger)
    }

    /// Stops console output; the console is gone after `ExitBootServices`.
    pub fn exit_boot_services(&self) {
        self.boot_services_available.store(false, Ordering::Release);
    }
}

impl Log for UefiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        qemu_trace!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );

        if self.boot_services_available.load(Ordering::Acquire) {
            uefi::println!(
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
