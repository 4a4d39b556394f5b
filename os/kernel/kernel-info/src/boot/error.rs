/// Why a boot descriptor was rejected. Always fatal for the kernel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CorruptDescriptor {
    #[error("boot descriptor address is null")]
    Null,
    #[error("boot descriptor address {0:#x} is misaligned")]
    Misaligned(u64),
    #[error("bad boot descriptor magic {0:#018x}")]
    BadMagic(u64),
    #[error("unsupported boot descriptor version {0}")]
    UnsupportedVersion(u16),
    #[error("boot descriptor length {0} does not match this kernel's layout")]
    LengthMismatch(u32),
    #[error("reserved boot flags set: {0:#06x}")]
    ReservedFlags(u16),
    #[error("{0}: null pointer with non-zero length")]
    NullBuffer(&'static str),
    #[error("{0}: pointer with zero length")]
    DanglingPointer(&'static str),
    #[error("{0}: misaligned pointer")]
    MisalignedBuffer(&'static str),
    #[error("{0}: buffer exceeds the address space")]
    BufferOverflow(&'static str),
    #[error("graphical flag set without a framebuffer")]
    GraphicalWithoutFramebuffer,
    #[error("framebuffer present without the graphical flag")]
    FramebufferWithoutGraphical,
    #[error("symbols flag set without a symbol table")]
    SymbolsWithoutTable,
    #[error("symbol table present without the symbols flag")]
    TableWithoutSymbols,
    #[error("unknown memory region kind {0}")]
    UnknownMemoryKind(u32),
    #[error("unknown pixel format {0}")]
    UnknownPixelFormat(u32),
}
