use crate::qemu_trace;
use kernel_sync::{McsLock, Once};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct QemuLogger {
    max_level: LevelFilter,
    /// Keeps lines from different cores apart.
    line: McsLock<()>,
}

impl QemuLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self {
            max_level,
            line: McsLock::new(()),
        }
    }

    /// Installs the logger. Call once during early init.
    ///
    /// # Errors
    /// Fails if a logger was already installed.
    pub fn init(self) -> Result<(), SetLoggerError> {
        static LOGGER: Once<QemuLogger> = Once::new();

        let logger = LOGGER.get_or_init(|| self);
        log::set_logger(logger)?;
        log::set_max_level(logger.max_level);
        Ok(())
    }

    #[cfg(target_arch = "x86_64")]
    fn emit(&self, record: &Record) {
        // Records may come from interrupt handlers.
        self.line.with_lock_irq(|_| write_record(record));
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn emit(&self, record: &Record) {
        self.line.with_lock(|_| write_record(record));
    }
}

fn write_record(record: &Record) {
    qemu_trace!(
        "[{}] {}: {}\n",
        record.level(),
        record.target(),
        record.args()
    );
}

impl Log for QemuLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.emit(record);
        }
    }

    fn flush(&self) {}
}
