//! # Kernel Image Placement

use crate::error::{LoaderError, firmware};
use kernel_info::boot::KernelEntryFn;
use kernel_info::layout::{ENTRY_OFFSET, MAX_IMAGE_SIZE, PHYS_LOAD};
use kernel_info::memory::PAGE_SIZE;
use log::info;
use uefi::boot::{self, AllocateType, MemoryType};

/// Copies the flat kernel image to [`PHYS_LOAD`] and returns its entry point.
///
/// The pages are `LOADER_DATA`, so the kernel sees them as pending memory.
pub fn place_kernel(image: &[u8]) -> Result<KernelEntryFn, LoaderError> {
    if image.is_empty() {
        return Err(LoaderError::EmptyImage);
    }
    if image.len() > MAX_IMAGE_SIZE {
        return Err(LoaderError::ImageTooLarge {
            size: image.len(),
            limit: MAX_IMAGE_SIZE,
        });
    }

    #[allow(clippy::cast_possible_truncation)]
    let pages = image.len().div_ceil(PAGE_SIZE as usize);
    let base = boot::allocate_pages(
        AllocateType::Address(PHYS_LOAD),
        MemoryType::LOADER_DATA,
        pages,
    )
    .map_err(firmware("Failed to reserve kernel load address"))?;

    // SAFETY: `pages` pages at `base` were just allocated for us.
    unsafe {
        let dst = base.as_ptr();
        core::ptr::copy_nonoverlapping(image.as_ptr(), dst, image.len());
        #[allow(clippy::cast_possible_truncation)]
        core::ptr::write_bytes(
            dst.add(image.len()),
            0,
            pages * PAGE_SIZE as usize - image.len(),
        );
    }
    info!(
        "Kernel image placed at {PHYS_LOAD:#x} ({} bytes, {pages} pages)",
        image.len()
    );

    let entry = (PHYS_LOAD + ENTRY_OFFSET) as usize;
    // SAFETY: the image starts with the entry stub, linked for this address.
    Ok(unsafe { core::mem::transmute::<usize, KernelEntryFn>(entry) })
}
