//! # Firmware Memory Map
//!
//! Exits boot services and translates the firmware's descriptors into
//! [`MemoryRegion`] records.

use crate::error::{LoaderError, firmware};
use alloc::vec::Vec;
use kernel_info::memory::{MemoryKind, MemoryRegion};
use log::info;
use uefi::boot::{self, MemoryType};
use uefi::mem::memory_map::{MemoryMap, MemoryMapMut};

/// Allocates room for the memory map as it will look after `ExitBootServices`.
///
/// This seems to be the opposite of an exact science:
/// * After boot services were exited, allocation is impossible.
/// * The number of descriptors changes over time, not least because of this
///   very allocation.
///
/// As a result, we overallocate to hopefully have enough headroom.
pub fn reserve_memory_map() -> Result<Vec<MemoryRegion>, LoaderError> {
    const EXTRA_REGIONS: usize = 32;

    let probe = boot::memory_map(MemoryType::LOADER_DATA)
        .map_err(firmware("Failed to get memory map"))?;
    Ok(Vec::with_capacity(probe.len() + EXTRA_REGIONS))
}

/// Exits boot services and fills `regions` without allocating. Adjacent
/// descriptors of the same kind and attributes are merged.
///
/// After this returns, neither the UEFI allocator nor the console may be used.
pub fn exit_boot_services(
    mut regions: Vec<MemoryRegion>,
) -> Result<&'static [MemoryRegion], LoaderError> {
    info!("Exiting boot services ...");

    let mut map = unsafe { boot::exit_boot_services(None) };
    map.sort();

    let capacity = regions.capacity();
    for desc in map.entries() {
        let region = MemoryRegion::new(
            desc.phys_start,
            desc.page_count,
            region_kind(desc.ty),
            attribute_bits(desc.att.bits()),
        );
        if let Some(last) = regions.last_mut()
            && last.kind == region.kind
            && last.attributes == region.attributes
            && last.end() == region.start
        {
            last.pages += region.pages;
            continue;
        }
        if regions.len() == capacity {
            return Err(LoaderError::MemoryMapTooLarge { capacity });
        }
        regions.push(region);
    }

    info!(
        "Boot services exited, {} memory regions. We're now flying by instruments.",
        regions.len()
    );
    Ok(regions.leak())
}

fn region_kind(ty: MemoryType) -> MemoryKind {
    match ty {
        MemoryType::CONVENTIONAL | MemoryType::BOOT_SERVICES_CODE | MemoryType::BOOT_SERVICES_DATA => {
            MemoryKind::Free
        }
        // Holds the kernel image, the boot descriptor and everything it points to.
        MemoryType::LOADER_CODE | MemoryType::LOADER_DATA => MemoryKind::Pending,
        MemoryType::ACPI_RECLAIM => MemoryKind::AcpiReclaim,
        MemoryType::ACPI_NON_VOLATILE => MemoryKind::AcpiNvs,
        MemoryType::RUNTIME_SERVICES_CODE | MemoryType::RUNTIME_SERVICES_DATA => {
            MemoryKind::FirmwareRuntime
        }
        MemoryType::MMIO | MemoryType::MMIO_PORT_SPACE => MemoryKind::Mmio,
        MemoryType::PERSISTENT_MEMORY => MemoryKind::Persistent,
        _ => MemoryKind::Reserved,
    }
}

/// Keeps the cacheability and protection bits. The runtime bit (63) is
/// implied by [`MemoryKind::FirmwareRuntime`].
#[allow(clippy::cast_possible_truncation)]
const fn attribute_bits(bits: u64) -> u32 {
    bits as u32
}
