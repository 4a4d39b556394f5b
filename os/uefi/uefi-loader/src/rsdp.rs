//! # Root/Extended System Description Pointer

use alloc::vec::Vec;
use log::{debug, warn};
use uefi::system;
use uefi::table::cfg::{ACPI_GUID, ACPI2_GUID};

/// Size of the ACPI 1.0 RSDP.
const RSDP_V1_LEN: usize = 20;
/// Offset of the revision byte.
const REVISION: usize = 15;
/// Offset of the 32-bit length field (revision 2 and later).
const LENGTH: usize = 20;
/// Largest RSDP any revision defines.
const RSDP_MAX_LEN: usize = 36;

/// The RSDP the firmware advertised, copied into loader memory.
pub struct Rsdp {
    pub address: u64,
    pub bytes: Vec<u8>,
}

/// Returns the physical address of the RSDP, preferring the ACPI 2.0 entry.
fn find_rsdp_addr() -> Option<u64> {
    system::with_config_table(|table| {
        table
            .iter()
            .find(|entry| entry.guid == ACPI2_GUID)
            .or_else(|| table.iter().find(|entry| entry.guid == ACPI_GUID))
            .map(|entry| entry.address as usize as u64)
    })
}

/// Locates the RSDP and copies the structure.
pub fn find_rsdp() -> Option<Rsdp> {
    let Some(address) = find_rsdp_addr().filter(|&a| a != 0) else {
        warn!("Firmware advertises no ACPI RSDP");
        return None;
    };

    // SAFETY: the firmware maps its configuration tables while boot
    // services are active; the v1 structure is always present.
    let head = unsafe { core::slice::from_raw_parts(address as usize as *const u8, RSDP_V1_LEN) };
    let len = if head[REVISION] >= 2 {
        // SAFETY: revision 2 guarantees the length field.
        let raw = unsafe { core::ptr::read_unaligned((address as usize + LENGTH) as *const u32) };
        (raw as usize).clamp(RSDP_V1_LEN, RSDP_MAX_LEN)
    } else {
        RSDP_V1_LEN
    };

    // SAFETY: `len` bytes are covered by the structure's own length.
    let bytes = unsafe { core::slice::from_raw_parts(address as usize as *const u8, len) }.to_vec();
    debug!("RSDP at {address:#x}, revision {}, {len} bytes", head[REVISION]);
    Some(Rsdp { address, bytes })
}
