use super::{CorruptDescriptor, CountedBuffer};

/// Framebuffer record as laid out in the descriptor.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FramebufferInfo {
    /// Linear framebuffer base address and size in **bytes**.
    /// Valid to write after `ExitBootServices`.
    pub buffer: CountedBuffer<u8>,

    /// Visible width in **pixels**.
    pub width: u32,

    /// Visible height in **pixels**.
    pub height: u32,

    /// Pixels per scanline. May be >= width due to padding.
    pub stride: u32,

    /// Raw [`PixelFormat`] discriminant.
    pub format: u32,

    /// Only meaningful for [`PixelFormat::Bitmask`].
    pub masks: PixelMasks,
}

impl FramebufferInfo {
    #[must_use]
    pub fn from_framebuffer(fb: &Framebuffer) -> Self {
        Self {
            buffer: CountedBuffer::from_raw(fb.base, fb.size),
            width: fb.width,
            height: fb.height,
            stride: fb.stride,
            format: fb.format as u32,
            masks: fb.masks,
        }
    }

    /// # Errors
    /// [`CorruptDescriptor::UnknownPixelFormat`] for a format this kernel
    /// can't draw to.
    pub fn to_framebuffer(&self) -> Result<Framebuffer, CorruptDescriptor> {
        let format = PixelFormat::try_from(self.format)
            .map_err(CorruptDescriptor::UnknownPixelFormat)?;
        Ok(Framebuffer {
            base: self.buffer.ptr,
            size: self.buffer.count,
            width: self.width,
            height: self.height,
            stride: self.stride,
            format,
            masks: self.masks,
        })
    }
}

/// A linear framebuffer. This is device memory, so it's described by
/// address rather than borrowed as a slice.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Framebuffer {
    pub base: u64,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: PixelFormat,
    pub masks: PixelMasks,
}

/// Pixel layout of a linear framebuffer.
///
/// GOP's `BltOnly` mode has no linear framebuffer and is never described.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PixelFormat {
    /// 8:8:8, stored as R,G,B in low-to-high bytes.
    Rgb = 0,
    /// 8:8:8, stored as B,G,R in low-to-high bytes.
    Bgr = 1,
    /// Channel positions given by [`PixelMasks`].
    Bitmask = 2,
}

impl TryFrom<u32> for PixelFormat {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Rgb),
            1 => Ok(Self::Bgr),
            2 => Ok(Self::Bitmask),
            other => Err(other),
        }
    }
}

/// Bit masks for [`PixelFormat::Bitmask`]; zero otherwise.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PixelMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub alpha: u32,
}
