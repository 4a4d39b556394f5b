use uefi::Status;
use uefi_status::error_message;

/// Everything that stops the loader before the kernel runs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LoaderError {
    #[error("{what}: {}", error_message(*.status))]
    Firmware { what: &'static str, status: Status },
    #[error("kernel image of {size} bytes exceeds the limit of {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },
    #[error("kernel image is empty")]
    EmptyImage,
    #[error("memory map grew past the {capacity} regions reserved for it")]
    MemoryMapTooLarge { capacity: usize },
}

impl LoaderError {
    pub const fn firmware(what: &'static str, status: Status) -> Self {
        Self::Firmware { what, status }
    }
}

/// Adapter for `map_err` on firmware calls.
pub fn firmware<D: core::fmt::Debug>(what: &'static str) -> impl FnOnce(uefi::Error<D>) -> LoaderError {
    move |e| LoaderError::firmware(what, e.status())
}

impl From<LoaderError> for Status {
    fn from(error: LoaderError) -> Self {
        match error {
            LoaderError::Firmware { status, .. } => status,
            LoaderError::ImageTooLarge { .. } => Self::BAD_BUFFER_SIZE,
            LoaderError::EmptyImage => Self::LOAD_ERROR,
            LoaderError::MemoryMapTooLarge { .. } => Self::BUFFER_TOO_SMALL,
        }
    }
}
