//! # Kernel Boot Interface
//!
//! This crate defines the binary contract between the UEFI loader and the
//! kernel: the boot descriptor the loader writes before `ExitBootServices`,
//! the memory-region records it carries, and the handful of layout constants
//! both sides (and the kernel's `build.rs`) have to agree on.
//!
//! ## Architecture
//!
//! ### Boot Descriptor ([`boot`])
//! * **Encode**: [`BootDescriptorBuilder`](boot::BootDescriptorBuilder) fills a
//!   [`BootDescriptor`](boot::BootDescriptor) from loader-owned buffers. Encoding
//!   cannot fail; the flag bits are derived from what was supplied.
//! * **Decode**: [`BootDescriptor::decode`](boot::BootDescriptor::decode) validates
//!   the blob the kernel receives and returns a borrowed [`BootInfo`](boot::BootInfo)
//!   view, or a [`CorruptDescriptor`](boot::CorruptDescriptor) describing the first
//!   violated invariant.
//!
//! ### Memory Regions ([`memory`])
//! Firmware-independent physical memory records.
//!
//! ### Layout ([`layout`])
//! Physical load address and stack sizing of the flat kernel image.
//!
//! ## Blob Layout
//!
//! ```text
//! offset  field
//! 0x00    magic            u64   "OSBOOTD\0"
//! 0x08    version          u16
//! 0x0a    flags            u16   graphical=0x1, panic=0x2, symbols=0x4
//! 0x0c    length           u32   size of the descriptor in bytes
//! 0x10    acpi.table       (u64 ptr, u64 count)
//! 0x20    acpi.root        u64   RSDP physical address, 0 if absent
//! 0x28    memory_map       (u64 ptr, u64 count) of MemoryRegion
//! 0x38    framebuffer      (u64 ptr, u64 bytes) + geometry + format + masks
//! 0x68    symbol_table     (u64 ptr, u64 count)
//! ```
//!
//! Every counted buffer is either `(0, 0)` or has a non-null pointer and a
//! non-zero count.
//!
//! ## Entry Point Convention
//! ```rust
//! # use kernel_info::boot::BootDescriptor;
//! pub type KernelEntryFn = extern "win64" fn(*const BootDescriptor) -> !;
//! ```
//!
//! The loader runs as a PE/COFF image, hence `win64`: the descriptor address
//! arrives in `rcx`.
//!
//! ## Build Script Integration
//! ```rust
//! use kernel_info::layout::PHYS_LOAD;
//!
//! println!("cargo:rustc-link-arg=--defsym=PHYS_LOAD={PHYS_LOAD:#x}");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod layout;
pub mod memory;
