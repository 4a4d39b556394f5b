//! # UEFI Loader
//!
//! Loads the flat kernel image, gathers what the kernel needs from the
//! firmware, exits boot services and jumps into the kernel with a
//! [`BootDescriptor`].
//!
//! ```text
//! UEFI Firmware Boot
//!         ↓
//! ┌─────────────────────────────────────────────┐
//! │              UEFI Loader                    │
//! ├─────────────────────────────────────────────┤
//! │  1. Logging, allocator                      │
//! │  2. \EFI\Boot\boot.cfg        (optional)    │
//! │  3. \EFI\Boot\kernel.bin  →  PHYS_LOAD      │
//! │  4. \EFI\Boot\kernel.sym      (optional)    │
//! │  5. ACPI RSDP, GOP framebuffer              │
//! │  6. ExitBootServices, memory map            │
//! │  7. Boot descriptor, jump                   │
//! └─────────────────────────────────────────────┘
//!         ↓
//! Kernel (identity mapped, win64 entry)
//! ```
//!
//! Everything the descriptor points to lives in `LOADER_DATA` pages, which
//! the memory map reports as [`MemoryKind::Pending`](kernel_info::memory::MemoryKind::Pending).
//! Firmware statuses are logged through [`uefi_status::error_message`].

#![cfg_attr(not(any(test, doctest)), no_std)]
#![no_main]
#![allow(unsafe_code)]
extern crate alloc;

mod config;
mod error;
mod file_system;
mod framebuffer;
mod image;
mod logger;
mod memory_map;
mod rsdp;
mod tracing;

use crate::config::read_boot_config;
use crate::error::LoaderError;
use crate::file_system::{load_file, load_optional_file};
use crate::framebuffer::get_framebuffer;
use crate::image::place_kernel;
use crate::logger::UefiLogger;
use crate::memory_map::{exit_boot_services, reserve_memory_map};
use crate::rsdp::find_rsdp;
use crate::tracing::trace_descriptor;
use alloc::boxed::Box;
use alloc::vec::Vec;
use kernel_info::boot::{BootDescriptor, BootDescriptorBuilder, Framebuffer, KernelEntryFn};
use kernel_info::memory::MemoryRegion;
use kernel_qemu::qemu_trace;
use log::{LevelFilter, error, info};
use uefi::cstr16;
use uefi::prelude::*;

/// Everything gathered while boot services were still around.
struct Handoff {
    entry: KernelEntryFn,
    panic: bool,
    acpi_table: &'static [u8],
    acpi_root: u64,
    framebuffer: Option<Framebuffer>,
    symbol_table: &'static [u8],
    descriptor: &'static mut BootDescriptor,
    regions: Vec<MemoryRegion>,
}

#[entry]
fn efi_main() -> Status {
    if let Err(e) = uefi::helpers::init() {
        uefi::println!("Failed to initialize: {}", uefi_status::error_message(e.status()));
        return e.status();
    }

    let Ok(logger) = UefiLogger::new(LevelFilter::Debug).init() else {
        return Status::ALREADY_STARTED;
    };
    info!("UEFI Loader reporting to QEMU");

    let handoff = match prepare() {
        Ok(handoff) => handoff,
        Err(e) => {
            error!("Boot aborted: {e}");
            return e.into();
        }
    };

    logger.exit_boot_services();
    let memory_map = match exit_boot_services(handoff.regions) {
        Ok(map) => map,
        Err(e) => {
            // Nobody left to return a status to.
            qemu_trace!("Boot aborted after ExitBootServices: {e}\n");
            halt()
        }
    };

    let mut builder = BootDescriptorBuilder::new()
        .acpi(handoff.acpi_table, handoff.acpi_root)
        .memory_map(memory_map)
        .symbol_table(handoff.symbol_table)
        .panic(handoff.panic);
    if let Some(framebuffer) = handoff.framebuffer {
        builder = builder.framebuffer(framebuffer);
    }
    *handoff.descriptor = builder.build();

    trace_descriptor(handoff.descriptor);
    qemu_trace!("UEFI is about to jump into Kernel land. Ciao Kakao ...\n");
    (handoff.entry)(handoff.descriptor)
}

fn prepare() -> Result<Handoff, LoaderError> {
    let config = read_boot_config()?;

    info!("Attempting to load kernel.bin ...");
    let image = load_file(cstr16!("\\EFI\\Boot\\kernel.bin"))?;
    let entry = place_kernel(&image)?;
    drop(image);

    let symbol_table: &'static [u8] = load_optional_file(cstr16!("\\EFI\\Boot\\kernel.sym"))?
        .map_or(&[][..], |bytes| &*bytes.leak());

    let (acpi_table, acpi_root) = match find_rsdp() {
        Some(rsdp) => (&*rsdp.bytes.leak(), rsdp.address),
        None => (&[][..], 0),
    };

    let framebuffer = get_framebuffer();

    // Allocated now; filled once the memory map is final.
    let descriptor = Box::leak(Box::new(BootDescriptorBuilder::new().build()));
    let regions = reserve_memory_map()?;

    Ok(Handoff {
        entry,
        panic: config.panic,
        acpi_table,
        acpi_root,
        framebuffer,
        symbol_table,
        descriptor,
        regions,
    })
}

fn halt() -> ! {
    loop {
        // SAFETY: parks the core; nothing else runs after ExitBootServices.
        unsafe { core::arch::asm!("cli", "hlt", options(nomem, nostack)) };
    }
}
