//! # GOP for the Kernel

use kernel_info::boot::{Framebuffer, PixelFormat, PixelMasks};
use log::{debug, info, warn};
use uefi::boot::{self, ScopedProtocol};
use uefi::proto::console::gop::{self, GraphicsOutput, Mode};

/// Switches to the best linear mode and describes it. `None` on headless
/// machines and for blit-only adapters; the kernel then boots without
/// graphics.
#[allow(clippy::cast_possible_truncation)]
pub fn get_framebuffer() -> Option<Framebuffer> {
    let mut gop = match get_gop() {
        Ok(gop) => gop,
        Err(e) => {
            info!("No graphics output: {}", uefi_status::error_message(e.status()));
            return None;
        }
    };

    debug!("Found {} GOP modes", gop.modes().count());

    // Prefer 1080p over others; if none found, pick the largest one.
    let mode = gop
        .modes()
        .filter(is_linear)
        .find(|mode| mode.info().resolution().1 == 1080)
        .or_else(|| largest_mode(&gop));
    if let Some(mode) = mode {
        if let Err(e) = gop.set_mode(&mode) {
            warn!("Failed to set GOP mode: {}", uefi_status::error_message(e.status()));
        }
    }

    let mode = gop.current_mode_info();
    let (format, masks) = match mode.pixel_format() {
        gop::PixelFormat::Rgb => (PixelFormat::Rgb, PixelMasks::default()),
        gop::PixelFormat::Bgr => (PixelFormat::Bgr, PixelMasks::default()),
        gop::PixelFormat::Bitmask => {
            let Some(mask) = mode.pixel_bitmask() else {
                warn!("Bitmask pixel format without masks");
                return None;
            };
            (
                PixelFormat::Bitmask,
                PixelMasks {
                    red: mask.red,
                    green: mask.green,
                    blue: mask.blue,
                    alpha: mask.reserved,
                },
            )
        }
        gop::PixelFormat::BltOnly => {
            info!("GOP is blit-only, booting without framebuffer");
            return None;
        }
    };

    let (width, height) = mode.resolution();
    let mut fb = gop.frame_buffer();
    let framebuffer = Framebuffer {
        base: fb.as_mut_ptr() as u64,
        size: fb.size() as u64,
        width: width as u32,
        height: height as u32,
        stride: mode.stride() as u32,
        format,
        masks,
    };
    info!("Framebuffer {width}x{height} {format:?} at {:#x}", framebuffer.base);
    Some(framebuffer)
}

fn is_linear(mode: &Mode) -> bool {
    matches!(
        mode.info().pixel_format(),
        gop::PixelFormat::Rgb | gop::PixelFormat::Bgr
    )
}

fn largest_mode(gop: &ScopedProtocol<GraphicsOutput>) -> Option<Mode> {
    gop.modes().filter(is_linear).max_by_key(|mode| {
        let (w, h) = mode.info().resolution();
        w * h
    })
}

fn get_gop() -> uefi::Result<ScopedProtocol<GraphicsOutput>> {
    let handle = boot::get_handle_for_protocol::<GraphicsOutput>()?;
    boot::open_protocol_exclusive::<GraphicsOutput>(handle)
}
