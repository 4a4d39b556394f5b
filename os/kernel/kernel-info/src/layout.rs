//! # Kernel Image Layout

/// Where the loader places the flat kernel image in *physical* memory.
///
/// The loader keeps the firmware's identity mapping, so this is also the
/// address the kernel is linked at.
///
/// # Kernel Build
/// This information is sourced in the kernel's `build.rs` to configure
/// the linker.
pub const PHYS_LOAD: u64 = 0x0010_0000; // 1 MiB

/// Offset of the entry stub within the image. The linker script places
/// `.text.entry` first.
pub const ENTRY_OFFSET: u64 = 0;

/// The size of the boot stack the kernel switches to on entry.
pub const KERNEL_STACK_SIZE: usize = 64 * 1024;

/// Upper bound for the flat kernel image. The loader refuses larger files.
pub const MAX_IMAGE_SIZE: usize = 16 * 1024 * 1024;

const _: () = {
    assert!(KERNEL_STACK_SIZE.is_multiple_of(4096));
    assert!(PHYS_LOAD.is_multiple_of(4096));
    assert!(MAX_IMAGE_SIZE.is_multiple_of(4096));
};
