//! # Firmware status text
//!
//! Human-readable descriptions for UEFI status codes, for the loader's
//! early diagnostics. The table ends in a sentinel with an empty
//! description; codes not in the table read as `"Unknown"`.
//!
//! ```
//! use uefi::Status;
//! use uefi_status::error_message;
//!
//! assert_eq!(error_message(Status::NOT_FOUND), "Not Found");
//! assert_eq!(error_message(Status(0x1234)), "Unknown");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

use uefi::Status;

/// Returned for any status the table doesn't know.
pub const UNKNOWN: &str = "Unknown";

/// One row of [`STATUS_TABLE`].
#[derive(Debug, Copy, Clone)]
pub struct StatusText {
    pub status: Status,
    pub description: &'static str,
}

macro_rules! status_table {
    ($($status:ident => $description:literal,)*) => {
        /// All known statuses, terminated by a sentinel with an empty description.
        pub static STATUS_TABLE: &[StatusText] = &[
            $( StatusText { status: Status::$status, description: $description }, )*
            StatusText { status: Status::SUCCESS, description: "" },
        ];
    };
}

status_table! {
    SUCCESS => "Success",
    WARN_UNKNOWN_GLYPH => "Unknown Glyph",
    WARN_DELETE_FAILURE => "Delete Failure",
    WARN_WRITE_FAILURE => "Write Failure",
    WARN_BUFFER_TOO_SMALL => "Buffer Too Small (warning)",
    WARN_STALE_DATA => "Stale Data",
    WARN_FILE_SYSTEM => "File System",
    WARN_RESET_REQUIRED => "Reset Required",
    LOAD_ERROR => "Load Error",
    INVALID_PARAMETER => "Invalid Parameter",
    UNSUPPORTED => "Unsupported",
    BAD_BUFFER_SIZE => "Bad Buffer Size",
    BUFFER_TOO_SMALL => "Buffer Too Small",
    NOT_READY => "Not Ready",
    DEVICE_ERROR => "Device Error",
    WRITE_PROTECTED => "Write Protected",
    OUT_OF_RESOURCES => "Out of Resources",
    VOLUME_CORRUPTED => "Volume Corrupt",
    VOLUME_FULL => "Volume Full",
    NO_MEDIA => "No Media",
    MEDIA_CHANGED => "Media Changed",
    NOT_FOUND => "Not Found",
    ACCESS_DENIED => "Access Denied",
    NO_RESPONSE => "No Response",
    NO_MAPPING => "No Mapping",
    TIMEOUT => "Time Out",
    NOT_STARTED => "Not Started",
    ALREADY_STARTED => "Already Started",
    ABORTED => "Aborted",
    ICMP_ERROR => "ICMP Error",
    TFTP_ERROR => "TFTP Error",
    PROTOCOL_ERROR => "Protocol Error",
    INCOMPATIBLE_VERSION => "Incompatible Version",
    SECURITY_VIOLATION => "Security Violation",
    CRC_ERROR => "CRC Error",
    END_OF_MEDIA => "End of Media",
    END_OF_FILE => "End of File",
    INVALID_LANGUAGE => "Invalid Language",
    COMPROMISED_DATA => "Compromised Data",
}

/// Describes `status`. Never fails.
#[must_use]
pub fn error_message(status: Status) -> &'static str {
    STATUS_TABLE
        .iter()
        .take_while(|entry| !entry.description.is_empty())
        .find(|entry| entry.status == status)
        .map_or(UNKNOWN, |entry| entry.description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_their_text() {
        assert_eq!(error_message(Status::SUCCESS), "Success");
        assert_eq!(error_message(Status::BUFFER_TOO_SMALL), "Buffer Too Small");
        assert_eq!(error_message(Status::WARN_STALE_DATA), "Stale Data");
    }

    #[test]
    fn absent_codes_are_unknown() {
        assert_eq!(error_message(Status(0xdead_beef)), UNKNOWN);
        assert_eq!(error_message(Status((1 << (usize::BITS - 1)) | 0x7777)), UNKNOWN);
    }

    #[test]
    fn table_ends_in_a_single_sentinel() {
        let last = STATUS_TABLE.last().unwrap();
        assert!(last.description.is_empty());
        let empty = STATUS_TABLE
            .iter()
            .filter(|e| e.description.is_empty())
            .count();
        assert_eq!(empty, 1);
    }

    #[test]
    fn every_row_is_reachable() {
        for entry in STATUS_TABLE.iter().filter(|e| !e.description.is_empty()) {
            assert_eq!(error_message(entry.status), entry.description);
        }
    }
}
