//! Kernel-owned copy of the boot descriptor.

use kernel_info::boot::{BootFlags, BootInfo, Framebuffer};
use kernel_info::memory::{MemoryRegion, PAGE_SIZE};

/// Bytes of ACPI data kept. The root pointer structure is at most 36 bytes,
/// so this leaves room for firmware that hands over more.
pub const MAX_ACPI_BYTES: usize = 4096;

/// Memory regions kept. Firmware maps on real machines stay well below this.
pub const MAX_REGIONS: usize = 256;

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("ACPI data of {len} bytes exceeds the snapshot capacity of {cap}")]
    AcpiTooLarge { len: usize, cap: usize },
    #[error("{count} memory regions exceed the snapshot capacity of {cap}")]
    TooManyRegions { count: usize, cap: usize },
}

/// What the kernel keeps from the boot descriptor once loader memory may be
/// reused. Read-only after early init.
#[derive(Debug, Clone)]
pub struct BootSnapshot {
    flags: BootFlags,
    acpi_root: u64,
    acpi: [u8; MAX_ACPI_BYTES],
    acpi_len: usize,
    regions: [MemoryRegion; MAX_REGIONS],
    region_count: usize,
    framebuffer: Option<Framebuffer>,
    symbol_table_len: usize,
}

impl BootSnapshot {
    /// Copies the ACPI data and the memory map out of `info`.
    ///
    /// # Errors
    /// If either doesn't fit the fixed capacity.
    pub fn capture(info: &BootInfo<'_>) -> Result<Self, SnapshotError> {
        let acpi = info.acpi.table;
        if acpi.len() > MAX_ACPI_BYTES {
            return Err(SnapshotError::AcpiTooLarge {
                len: acpi.len(),
                cap: MAX_ACPI_BYTES,
            });
        }
        if info.memory_map.len() > MAX_REGIONS {
            return Err(SnapshotError::TooManyRegions {
                count: info.memory_map.len(),
                cap: MAX_REGIONS,
            });
        }

        let mut snapshot = Self {
            flags: info.flags,
            acpi_root: info.acpi.root,
            acpi: [0; MAX_ACPI_BYTES],
            acpi_len: acpi.len(),
            regions: [MemoryRegion {
                start: 0,
                pages: 0,
                kind: 0,
                attributes: 0,
            }; MAX_REGIONS],
            region_count: info.memory_map.len(),
            framebuffer: info.framebuffer,
            symbol_table_len: info.symbol_table.map_or(0, <[u8]>::len),
        };
        snapshot.acpi[..acpi.len()].copy_from_slice(acpi);
        snapshot.regions[..info.memory_map.len()].copy_from_slice(info.memory_map);
        Ok(snapshot)
    }

    #[must_use]
    pub const fn flags(&self) -> BootFlags {
        self.flags
    }

    #[must_use]
    pub fn acpi_table(&self) -> &[u8] {
        &self.acpi[..self.acpi_len]
    }

    /// RSDP physical address, 0 if the firmware had none.
    #[must_use]
    pub const fn acpi_root(&self) -> u64 {
        self.acpi_root
    }

    #[must_use]
    pub fn memory_map(&self) -> &[MemoryRegion] {
        &self.regions[..self.region_count]
    }

    #[must_use]
    pub const fn framebuffer(&self) -> Option<&Framebuffer> {
        self.framebuffer.as_ref()
    }

    /// Size of the symbol table the loader provided; the table itself stays
    /// in loader memory.
    #[must_use]
    pub const fn symbol_table_len(&self) -> usize {
        self.symbol_table_len
    }

    /// Bytes the kernel may allocate from once boot memory is reclaimed.
    #[must_use]
    pub fn usable_bytes(&self) -> u64 {
        self.memory_map()
            .iter()
            .filter(|r| r.is_usable_after_boot())
            .map(|r| r.pages.saturating_mul(PAGE_SIZE))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_info::boot::{BootDescriptor, BootDescriptorBuilder};
    use kernel_info::memory::MemoryKind;

    #[test]
    fn snapshot_outlives_loader_buffers() {
        let snapshot = {
            let acpi = vec![0x52, 0x53, 0x44, 0x20];
            let map = vec![
                MemoryRegion::new(0, 0x9f, MemoryKind::Free, 0),
                MemoryRegion::new(0x10_0000, 0x100, MemoryKind::Pending, 0),
                MemoryRegion::new(0xfee0_0000, 1, MemoryKind::Mmio, 0),
            ];
            let descriptor = BootDescriptorBuilder::new()
                .acpi(&acpi, 0xe_0000)
                .memory_map(&map)
                .build();
            let info = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap();
            BootSnapshot::capture(&info).unwrap()
        };

        assert_eq!(snapshot.acpi_table(), &[0x52, 0x53, 0x44, 0x20]);
        assert_eq!(snapshot.acpi_root(), 0xe_0000);
        assert_eq!(snapshot.memory_map().len(), 3);
        assert_eq!(snapshot.memory_map()[2].kind(), Some(MemoryKind::Mmio));
        assert_eq!(snapshot.usable_bytes(), (0x9f + 0x100) * PAGE_SIZE);
        assert!(snapshot.framebuffer().is_none());
        assert_eq!(snapshot.symbol_table_len(), 0);
    }

    #[test]
    fn oversized_inputs_are_rejected() {
        let acpi = vec![0u8; MAX_ACPI_BYTES + 1];
        let descriptor = BootDescriptorBuilder::new().acpi(&acpi, 1).build();
        let info = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap();
        assert_eq!(
            BootSnapshot::capture(&info).unwrap_err(),
            SnapshotError::AcpiTooLarge {
                len: MAX_ACPI_BYTES + 1,
                cap: MAX_ACPI_BYTES
            }
        );

        let map = vec![MemoryRegion::new(0, 1, MemoryKind::Free, 0); MAX_REGIONS + 1];
        let descriptor = BootDescriptorBuilder::new().memory_map(&map).build();
        let info = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap();
        assert!(matches!(
            BootSnapshot::capture(&info),
            Err(SnapshotError::TooManyRegions { .. })
        ));
    }
}
