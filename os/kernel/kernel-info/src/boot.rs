//! # Kernel Boot Descriptor

mod counted;
mod error;
mod framebuffer;

use crate::memory::MemoryRegion;
use bitfield_struct::bitfield;

pub use counted::CountedBuffer;
pub use error::CorruptDescriptor;
pub use framebuffer::{Framebuffer, FramebufferInfo, PixelFormat, PixelMasks};

/// Kernel function pointer.
///
/// # ABI
/// The ABI is defined as `win64` since the kernel is called from a UEFI
/// (PE/COFF) application.
pub type KernelEntryFn = extern "win64" fn(*const BootDescriptor) -> !;

/// `"OSBOOTD\0"`, little endian.
pub const BOOT_DESCRIPTOR_MAGIC: u64 = u64::from_le_bytes(*b"OSBOOTD\0");

/// Layout revision. Bumped whenever a field changes meaning or position.
pub const BOOT_DESCRIPTOR_VERSION: u16 = 1;

/// Boot-time flags.
///
/// These are the only definitions of the flag bits; loader and kernel both
/// go through this type.
#[bitfield(u16, order = Lsb)]
#[derive(PartialEq, Eq)]
pub struct BootFlags {
    /// A linear framebuffer is described in [`BootDescriptor::framebuffer`] (bit 0).
    pub graphical: bool,

    /// Escalate early-boot warnings to a halt (bit 1).
    pub panic: bool,

    /// A symbol table is described in [`BootDescriptor::symbol_table`] (bit 2).
    pub symbols: bool,

    /// Reserved, must be zero.
    #[bits(13)]
    __: u16,
}

impl BootFlags {
    /// All bits with a defined meaning.
    pub const KNOWN_BITS: u16 = 0b111;

    /// Bits set outside [`Self::KNOWN_BITS`].
    #[must_use]
    pub const fn reserved_bits(self) -> u16 {
        self.into_bits() & !Self::KNOWN_BITS
    }
}

/// ACPI data handed through untouched.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AcpiInfo {
    /// Raw copy of the firmware's ACPI root pointer structure.
    pub table: CountedBuffer<u8>,

    /// RSDP physical address, or 0 if the firmware did not provide one.
    pub root: u64,
}

/// The blob handed from the loader to the kernel.
///
/// All pointers are physical addresses, valid under the loader's identity
/// mapping. See the crate documentation for the byte layout.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct BootDescriptor {
    /// Always [`BOOT_DESCRIPTOR_MAGIC`].
    pub magic: u64,

    /// Always [`BOOT_DESCRIPTOR_VERSION`].
    pub version: u16,

    /// Raw [`BootFlags`] bits.
    pub flags: u16,

    /// Size of this structure as seen by the loader.
    pub length: u32,

    pub acpi: AcpiInfo,

    /// Physical memory map, already translated from firmware descriptors.
    pub memory_map: CountedBuffer<MemoryRegion>,

    /// Only meaningful if [`BootFlags::graphical`] is set.
    pub framebuffer: FramebufferInfo,

    /// Kernel symbol table. Only meaningful if [`BootFlags::symbols`] is set.
    pub symbol_table: CountedBuffer<u8>,
}

const _: () = {
    assert!(size_of::<BootDescriptor>() == 120);
    assert!(align_of::<BootDescriptor>() == 8);
};

/// Kernel-side view of a validated [`BootDescriptor`].
///
/// Borrows loader memory. Anything needed after boot memory is reclaimed
/// has to be copied out first.
#[derive(Debug, Clone)]
pub struct BootInfo<'a> {
    pub flags: BootFlags,
    pub acpi: AcpiTables<'a>,
    pub memory_map: &'a [MemoryRegion],
    pub framebuffer: Option<Framebuffer>,
    pub symbol_table: Option<&'a [u8]>,
}

#[derive(Debug, Copy, Clone)]
pub struct AcpiTables<'a> {
    pub table: &'a [u8],
    pub root: u64,
}

impl BootDescriptor {
    /// Validates the descriptor at `addr` and returns a borrowed view of it.
    ///
    /// Does not allocate.
    ///
    /// # Errors
    /// Returns the first violated invariant as a [`CorruptDescriptor`].
    ///
    /// # Safety
    /// If `addr` is non-null and aligned it must point to readable memory of
    /// at least `size_of::<BootDescriptor>()` bytes, and every non-empty
    /// buffer the descriptor names must be readable for `'a`.
    #[allow(unsafe_code)]
    pub unsafe fn decode<'a>(addr: *const Self) -> Result<BootInfo<'a>, CorruptDescriptor> {
        if addr.is_null() {
            return Err(CorruptDescriptor::Null);
        }
        if !addr.is_aligned() {
            return Err(CorruptDescriptor::Misaligned(addr as u64));
        }

        // SAFETY: non-null and aligned; readability is the caller's contract.
        let descriptor: &'a Self = unsafe { &*addr };
        descriptor.validate()?;

        // SAFETY: buffers were checked by `validate`; liveness is the caller's contract.
        let memory_map = unsafe { descriptor.memory_map.as_slice() };
        if let Some(region) = memory_map.iter().find(|r| r.kind().is_none()) {
            return Err(CorruptDescriptor::UnknownMemoryKind(region.kind));
        }

        let flags = descriptor.flags();
        Ok(BootInfo {
            flags,
            acpi: AcpiTables {
                // SAFETY: see above.
                table: unsafe { descriptor.acpi.table.as_slice() },
                root: descriptor.acpi.root,
            },
            memory_map,
            framebuffer: if flags.graphical() {
                Some(descriptor.framebuffer.to_framebuffer()?)
            } else {
                None
            },
            symbol_table: if flags.symbols() {
                // SAFETY: see above.
                Some(unsafe { descriptor.symbol_table.as_slice() })
            } else {
                None
            },
        })
    }

    /// Checks the structural invariants that don't require reading the
    /// buffers: header, flag bits, pointer/length pairs and the
    /// flag/record implications.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), CorruptDescriptor> {
        if self.magic != BOOT_DESCRIPTOR_MAGIC {
            return Err(CorruptDescriptor::BadMagic(self.magic));
        }
        if self.version != BOOT_DESCRIPTOR_VERSION {
            return Err(CorruptDescriptor::UnsupportedVersion(self.version));
        }
        if self.length as usize != size_of::<Self>() {
            return Err(CorruptDescriptor::LengthMismatch(self.length));
        }

        let flags = self.flags();
        if flags.reserved_bits() != 0 {
            return Err(CorruptDescriptor::ReservedFlags(flags.reserved_bits()));
        }

        self.acpi.table.check("acpi table")?;
        self.memory_map.check("memory map")?;
        self.framebuffer.buffer.check("framebuffer")?;
        self.symbol_table.check("symbol table")?;

        match (flags.graphical(), self.framebuffer.buffer.is_empty()) {
            (true, true) => return Err(CorruptDescriptor::GraphicalWithoutFramebuffer),
            (false, false) => return Err(CorruptDescriptor::FramebufferWithoutGraphical),
            _ => {}
        }
        match (flags.symbols(), self.symbol_table.is_empty()) {
            (true, true) => return Err(CorruptDescriptor::SymbolsWithoutTable),
            (false, false) => return Err(CorruptDescriptor::TableWithoutSymbols),
            _ => {}
        }
        Ok(())
    }

    #[must_use]
    pub const fn flags(&self) -> BootFlags {
        BootFlags::from_bits(self.flags)
    }
}

/// Loader-side encoder for [`BootDescriptor`].
///
/// The descriptor only records addresses; the slices passed in must stay
/// where they are until the kernel has copied what it needs.
///
/// ```
/// use kernel_info::boot::{BootDescriptor, BootDescriptorBuilder};
/// use kernel_info::memory::{MemoryKind, MemoryRegion};
///
/// let regions = [MemoryRegion::new(0x10_0000, 256, MemoryKind::Free, 0)];
/// let descriptor = BootDescriptorBuilder::new()
///     .memory_map(&regions)
///     .build();
///
/// let info = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap();
/// assert_eq!(info.memory_map, &regions);
/// assert!(!info.flags.graphical());
/// ```
#[derive(Debug, Default)]
pub struct BootDescriptorBuilder<'a> {
    acpi_table: &'a [u8],
    acpi_root: u64,
    memory_map: &'a [MemoryRegion],
    framebuffer: Option<Framebuffer>,
    symbol_table: &'a [u8],
    panic: bool,
}

impl<'a> BootDescriptorBuilder<'a> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            acpi_table: &[],
            acpi_root: 0,
            memory_map: &[],
            framebuffer: None,
            symbol_table: &[],
            panic: false,
        }
    }

    #[must_use]
    pub const fn acpi(mut self, table: &'a [u8], root: u64) -> Self {
        self.acpi_table = table;
        self.acpi_root = root;
        self
    }

    #[must_use]
    pub const fn memory_map(mut self, regions: &'a [MemoryRegion]) -> Self {
        self.memory_map = regions;
        self
    }

    /// A framebuffer without backing memory is dropped.
    #[must_use]
    pub const fn framebuffer(mut self, framebuffer: Framebuffer) -> Self {
        self.framebuffer = if framebuffer.base == 0 || framebuffer.size == 0 {
            None
        } else {
            Some(framebuffer)
        };
        self
    }

    #[must_use]
    pub const fn symbol_table(mut self, table: &'a [u8]) -> Self {
        self.symbol_table = table;
        self
    }

    #[must_use]
    pub const fn panic(mut self, panic: bool) -> Self {
        self.panic = panic;
        self
    }

    /// Produces the descriptor. Flags are derived from the supplied records,
    /// so the result always passes [`BootDescriptor::validate`].
    #[must_use]
    pub fn build(self) -> BootDescriptor {
        let flags = BootFlags::new()
            .with_graphical(self.framebuffer.is_some())
            .with_panic(self.panic)
            .with_symbols(!self.symbol_table.is_empty());

        BootDescriptor {
            magic: BOOT_DESCRIPTOR_MAGIC,
            version: BOOT_DESCRIPTOR_VERSION,
            flags: flags.into_bits(),
            #[allow(clippy::cast_possible_truncation)]
            length: size_of::<BootDescriptor>() as u32,
            acpi: AcpiInfo {
                table: CountedBuffer::from_slice(self.acpi_table),
                root: self.acpi_root,
            },
            memory_map: CountedBuffer::from_slice(self.memory_map),
            framebuffer: self
                .framebuffer
                .as_ref()
                .map(FramebufferInfo::from_framebuffer)
                .unwrap_or_default(),
            symbol_table: CountedBuffer::from_slice(self.symbol_table),
        }
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::memory::MemoryKind;

    fn regions() -> Vec<MemoryRegion> {
        vec![
            MemoryRegion::new(0, 0x9f, MemoryKind::Free, 0xf),
            MemoryRegion::new(0x10_0000, 0x400, MemoryKind::Pending, 0xf),
            MemoryRegion::new(0x7fe_0000, 0x20, MemoryKind::AcpiReclaim, 0xf),
            MemoryRegion::new(0xfee0_0000, 1, MemoryKind::Mmio, 0x1),
        ]
    }

    fn framebuffer() -> Framebuffer {
        Framebuffer {
            base: 0x8000_0000,
            size: 1024 * 768 * 4,
            width: 1024,
            height: 768,
            stride: 1024,
            format: PixelFormat::Bgr,
            masks: PixelMasks::default(),
        }
    }

    #[test]
    fn flag_bits_are_canonical() {
        assert_eq!(BootFlags::new().with_graphical(true).into_bits(), 0x1);
        assert_eq!(BootFlags::new().with_panic(true).into_bits(), 0x2);
        assert_eq!(BootFlags::new().with_symbols(true).into_bits(), 0x4);
        assert_eq!(BootFlags::from_bits(0x8).reserved_bits(), 0x8);
    }

    #[test]
    fn round_trip_preserves_contents() {
        let acpi = b"RSD PTR \x42\x00".to_vec();
        let map = regions();
        let symbols = b"ffff8000 kernel_main\n".to_vec();

        let descriptor = BootDescriptorBuilder::new()
            .acpi(&acpi, 0x7fe_1000)
            .memory_map(&map)
            .framebuffer(framebuffer())
            .symbol_table(&symbols)
            .panic(true)
            .build();

        let info = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap();
        assert!(info.flags.graphical());
        assert!(info.flags.panic());
        assert!(info.flags.symbols());
        assert_eq!(info.acpi.table, acpi.as_slice());
        assert_eq!(info.acpi.root, 0x7fe_1000);
        assert_eq!(info.memory_map, map.as_slice());
        assert_eq!(info.framebuffer, Some(framebuffer()));
        assert_eq!(info.symbol_table, Some(symbols.as_slice()));
    }

    #[test]
    fn empty_descriptor_is_valid() {
        let descriptor = BootDescriptorBuilder::new().build();
        let info = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap();
        assert_eq!(info.flags, BootFlags::new());
        assert!(info.acpi.table.is_empty());
        assert!(info.memory_map.is_empty());
        assert!(info.framebuffer.is_none());
        assert!(info.symbol_table.is_none());
    }

    #[test]
    fn empty_framebuffer_is_not_advertised() {
        let descriptor = BootDescriptorBuilder::new()
            .framebuffer(Framebuffer {
                size: 0,
                ..framebuffer()
            })
            .build();
        assert!(!descriptor.flags().graphical());
        assert!(descriptor.framebuffer.buffer.is_empty());
    }

    #[test]
    fn graphical_without_framebuffer_is_corrupt() {
        let mut descriptor = BootDescriptorBuilder::new().build();
        descriptor.flags = BootFlags::new().with_graphical(true).into_bits();
        let err = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap_err();
        assert_eq!(err, CorruptDescriptor::GraphicalWithoutFramebuffer);
    }

    #[test]
    fn framebuffer_without_graphical_is_corrupt() {
        let mut descriptor = BootDescriptorBuilder::new()
            .framebuffer(framebuffer())
            .build();
        descriptor.flags = 0;
        assert_eq!(
            descriptor.validate(),
            Err(CorruptDescriptor::FramebufferWithoutGraphical)
        );
    }

    #[test]
    fn symbols_without_table_is_corrupt() {
        let mut descriptor = BootDescriptorBuilder::new().build();
        descriptor.flags = BootFlags::new().with_symbols(true).into_bits();
        let err = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap_err();
        assert_eq!(err, CorruptDescriptor::SymbolsWithoutTable);
    }

    #[test]
    fn pointer_length_mismatch_is_corrupt() {
        let map = regions();
        let mut descriptor = BootDescriptorBuilder::new().memory_map(&map).build();
        descriptor.memory_map.ptr = 0;
        assert_eq!(
            descriptor.validate(),
            Err(CorruptDescriptor::NullBuffer("memory map"))
        );

        let mut descriptor = BootDescriptorBuilder::new().build();
        descriptor.acpi.table.ptr = 0x1000;
        assert_eq!(
            descriptor.validate(),
            Err(CorruptDescriptor::DanglingPointer("acpi table"))
        );
    }

    #[test]
    fn header_is_checked() {
        let mut descriptor = BootDescriptorBuilder::new().build();
        descriptor.magic = 0;
        assert_eq!(descriptor.validate(), Err(CorruptDescriptor::BadMagic(0)));

        let mut descriptor = BootDescriptorBuilder::new().build();
        descriptor.version = 7;
        assert_eq!(
            descriptor.validate(),
            Err(CorruptDescriptor::UnsupportedVersion(7))
        );

        let mut descriptor = BootDescriptorBuilder::new().build();
        descriptor.flags = 0x10;
        assert_eq!(
            descriptor.validate(),
            Err(CorruptDescriptor::ReservedFlags(0x10))
        );
    }

    #[test]
    fn null_address_is_corrupt() {
        let err = unsafe { BootDescriptor::decode(core::ptr::null()) }.unwrap_err();
        assert_eq!(err, CorruptDescriptor::Null);
    }

    #[test]
    fn unknown_memory_kind_is_corrupt() {
        let mut map = regions();
        map[2].kind = 99;
        let descriptor = BootDescriptorBuilder::new().memory_map(&map).build();
        let err = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap_err();
        assert_eq!(err, CorruptDescriptor::UnknownMemoryKind(99));
    }

    #[test]
    fn unknown_pixel_format_is_corrupt() {
        let mut descriptor = BootDescriptorBuilder::new()
            .framebuffer(framebuffer())
            .build();
        descriptor.framebuffer.format = 3;
        let err = unsafe { BootDescriptor::decode(&raw const descriptor) }.unwrap_err();
        assert_eq!(err, CorruptDescriptor::UnknownPixelFormat(3));
    }
}
