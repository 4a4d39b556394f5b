//! # Physical Memory Regions
//!
//! The loader translates the firmware memory map into [`MemoryRegion`]
//! records so the kernel never has to know the firmware's descriptor
//! layout or version.

/// Size of a page as counted by [`MemoryRegion::pages`].
pub const PAGE_SIZE: u64 = 4096;

/// What a physical memory region may be used for.
///
/// Stored as a raw `u32` in [`MemoryRegion`]; use [`MemoryRegion::kind`]
/// to interpret it.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MemoryKind {
    /// Conventional memory, free for the kernel.
    Free = 0,
    /// Held by the loader or boot services; free once the kernel no longer
    /// needs the boot descriptor.
    Pending = 1,
    /// ACPI tables; reclaimable after they have been parsed.
    AcpiReclaim = 2,
    /// ACPI non-volatile storage. Never reclaimed.
    AcpiNvs = 3,
    /// Firmware runtime services code and data.
    FirmwareRuntime = 4,
    /// Memory-mapped I/O.
    Mmio = 5,
    /// Persistent (non-volatile) memory.
    Persistent = 6,
    /// Unusable or reserved by the platform.
    Reserved = 7,
}

impl TryFrom<u32> for MemoryKind {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Free,
            1 => Self::Pending,
            2 => Self::AcpiReclaim,
            3 => Self::AcpiNvs,
            4 => Self::FirmwareRuntime,
            5 => Self::Mmio,
            6 => Self::Persistent,
            7 => Self::Reserved,
            other => return Err(other),
        })
    }
}

/// One contiguous range of physical memory.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemoryRegion {
    /// Physical start address, page aligned.
    pub start: u64,
    /// Length in [`PAGE_SIZE`] pages.
    pub pages: u64,
    /// Raw [`MemoryKind`] discriminant.
    pub kind: u32,
    /// Firmware attribute bits (cacheability, runtime), passed through.
    pub attributes: u32,
}

impl MemoryRegion {
    #[must_use]
    pub const fn new(start: u64, pages: u64, kind: MemoryKind, attributes: u32) -> Self {
        Self {
            start,
            pages,
            kind: kind as u32,
            attributes,
        }
    }

    /// The region's kind, or `None` if the raw value is not a known kind.
    #[must_use]
    pub fn kind(&self) -> Option<MemoryKind> {
        MemoryKind::try_from(self.kind).ok()
    }

    /// Size in bytes.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.pages.saturating_mul(PAGE_SIZE)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pages == 0
    }

    /// One past the last byte.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.start.saturating_add(self.len())
    }

    /// Whether the kernel may allocate from this region once it has copied
    /// everything it needs out of boot memory.
    #[must_use]
    pub fn is_usable_after_boot(&self) -> bool {
        matches!(
            self.kind(),
            Some(MemoryKind::Free | MemoryKind::Pending | MemoryKind::AcpiReclaim)
        )
    }
}

const _: () = {
    assert!(size_of::<MemoryRegion>() == 24);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_is_rejected() {
        let region = MemoryRegion {
            start: 0,
            pages: 1,
            kind: 42,
            attributes: 0,
        };
        assert_eq!(region.kind(), None);
        assert!(!region.is_usable_after_boot());
    }

    #[test]
    fn region_extent() {
        let region = MemoryRegion::new(0x10_0000, 16, MemoryKind::Free, 0);
        assert_eq!(region.len(), 16 * PAGE_SIZE);
        assert_eq!(region.end(), 0x11_0000);
        assert!(region.is_usable_after_boot());
        assert!(!MemoryRegion::new(0, 1, MemoryKind::Mmio, 0).is_usable_after_boot());
    }
}
