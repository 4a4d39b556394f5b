//! Status words shared by syscall return values and protocol `status`
//! messages.
//!
//! A status is a `u64`. With the top bit clear it is a success value; with
//! it set, the remaining bits are an [`Error`] code.

use core::fmt;

/// A raw 64-bit status word.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Status(u64);

impl Status {
    /// Marks a status as an error.
    pub const ERROR_BIT: u64 = 1 << 63;

    pub const OK: Self = Self(0);

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn into_raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        self.0 & Self::ERROR_BIT != 0
    }

    /// Encodes a result. Success values must leave the error bit clear; in
    /// release builds the bit is masked off.
    #[must_use]
    pub fn from_result(result: Result<u64, Error>) -> Self {
        match result {
            Ok(value) => {
                debug_assert!(
                    value & Self::ERROR_BIT == 0,
                    "success value {value:#x} collides with the error bit"
                );
                Self(value & !Self::ERROR_BIT)
            }
            Err(error) => error.status(),
        }
    }

    /// # Errors
    /// The decoded [`Error`] if the error bit is set.
    pub const fn into_result(self) -> Result<u64, Error> {
        if self.is_error() {
            Err(Error::from_code(self.0 & !Self::ERROR_BIT))
        } else {
            Ok(self.0)
        }
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.into_result() {
            Ok(value) => write!(f, "Status::Ok({value:#x})"),
            Err(error) => write!(f, "Status::Err({error:?})"),
        }
    }
}

impl From<Result<u64, Error>> for Status {
    fn from(result: Result<u64, Error>) -> Self {
        Self::from_result(result)
    }
}

/// Error codes. The discriminants are part of the ABI.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, thiserror::Error)]
pub enum Error {
    #[error("not implemented")]
    NotImplemented,
    #[error("unexpected message or state")]
    Unexpected,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("not ready")]
    NotReady,
    #[error("insufficient buffer or capacity")]
    Insufficient,
    #[error("invalid syscall number")]
    InvalidSyscall,
    #[error("operation not supported by this protocol")]
    UnsupportedOperation,
    /// A code this build does not know, kept verbatim.
    #[error("unknown error code {0:#x}")]
    Unknown(u64),
}

impl Error {
    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            Self::NotImplemented => 1,
            Self::Unexpected => 2,
            Self::InvalidArgument => 3,
            Self::NotReady => 4,
            Self::Insufficient => 5,
            Self::InvalidSyscall => 6,
            Self::UnsupportedOperation => 7,
            Self::Unknown(code) => code & !Status::ERROR_BIT,
        }
    }

    #[must_use]
    pub const fn from_code(code: u64) -> Self {
        match code {
            1 => Self::NotImplemented,
            2 => Self::Unexpected,
            3 => Self::InvalidArgument,
            4 => Self::NotReady,
            5 => Self::Insufficient,
            6 => Self::InvalidSyscall,
            7 => Self::UnsupportedOperation,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub const fn status(self) -> Status {
        Status(Status::ERROR_BIT | self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_survive_encoding() {
        for error in [
            Error::NotImplemented,
            Error::InvalidSyscall,
            Error::UnsupportedOperation,
            Error::Unknown(0x1234),
        ] {
            let status = error.status();
            assert!(status.is_error());
            assert_eq!(status.into_result(), Err(error));
        }
    }

    #[test]
    fn success_values_pass_through() {
        assert_eq!(Status::OK.into_result(), Ok(0));
        assert_eq!(Status::from_result(Ok(42)).into_raw(), 42);
        assert!(!Status::from_result(Ok(42)).is_error());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(Error::InvalidSyscall.status().into_raw(), (1 << 63) | 6);
        assert_eq!(Error::UnsupportedOperation.code(), 7);
    }
}
