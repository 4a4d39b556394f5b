//! # Boot Configuration
//!
//! `\EFI\Boot\boot.cfg` is optional. Its first two bytes (little-endian) are
//! requested [`BootFlags`]. Only `panic` is taken from it; `graphical` and
//! `symbols` follow from what the loader actually found.

use crate::error::LoaderError;
use crate::file_system::load_optional_file;
use kernel_info::boot::BootFlags;
use log::{debug, warn};
use uefi::cstr16;

#[derive(Debug, Copy, Clone, Default)]
pub struct BootConfig {
    pub panic: bool,
}

pub fn read_boot_config() -> Result<BootConfig, LoaderError> {
    let Some(bytes) = load_optional_file(cstr16!("\\EFI\\Boot\\boot.cfg"))? else {
        return Ok(BootConfig::default());
    };
    let [lo, hi, ..] = bytes[..] else {
        warn!("boot.cfg is shorter than two bytes, ignoring it");
        return Ok(BootConfig::default());
    };

    let requested = BootFlags::from_bits(u16::from_le_bytes([lo, hi]));
    let ignored = requested.into_bits() & !BootFlags::new().with_panic(true).into_bits();
    if ignored != 0 {
        debug!("boot.cfg: ignoring flag bits {ignored:#06x}");
    }
    Ok(BootConfig {
        panic: requested.panic(),
    })
}
