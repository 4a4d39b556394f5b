use crate::error::{LoaderError, firmware};
use alloc::vec;
use alloc::vec::Vec;
use log::debug;
use uefi::proto::media::file::{File, FileAttribute, FileMode, RegularFile};
use uefi::{CStr16, Status, boot};

/// Loads a file from the volume the loader was started from.
///
/// # Errors
/// Any firmware failure, including a missing file.
pub fn load_file(path: &CStr16) -> Result<Vec<u8>, LoaderError> {
    let mut sfs = boot::get_image_file_system(boot::image_handle())
        .map_err(firmware("Failed to get file system"))?;
    let mut volume = sfs
        .open_volume()
        .map_err(firmware("Failed to open root directory"))?;
    let handle = volume
        .open(path, FileMode::Read, FileAttribute::empty())
        .map_err(firmware("Failed to open file"))?;
    let mut file = handle
        .into_regular_file()
        .ok_or(LoaderError::firmware("Not a regular file", Status::UNSUPPORTED))?;

    // Get file size
    file.set_position(RegularFile::END_OF_FILE)
        .map_err(firmware("Failed to seek to file end"))?;
    let size = file.get_position().map_err(firmware("Failed to get file size"))?;
    file.set_position(0)
        .map_err(firmware("Failed to seek to file start"))?;

    let size = usize::try_from(size)
        .map_err(|_| LoaderError::firmware("File size exceeds address space", Status::BAD_BUFFER_SIZE))?;

    let mut buf = vec![0u8; size];
    let read = file
        .read(&mut buf)
        .map_err(firmware("Failed to read file contents"))?;
    if read != size {
        return Err(LoaderError::firmware("Short read", Status::END_OF_FILE));
    }

    debug!("Loaded {path} ({size} bytes)");
    Ok(buf)
}

/// Like [`load_file`], but a missing file is `Ok(None)`.
///
/// # Errors
/// Any firmware failure other than `NOT_FOUND`.
pub fn load_optional_file(path: &CStr16) -> Result<Option<Vec<u8>>, LoaderError> {
    match load_file(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(LoaderError::Firmware { status, .. }) if status == Status::NOT_FOUND => {
            debug!("{path} not present");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
