//! E-paper panel driver
//!
//! Drives a 1bpp e-paper controller over a command/data multiplexed SPI bus.
//!
//! ### Usage
//! The driver does not hide that you're working with the controller's RAM
//! planes directly. To display something you:
//!
//! 1. bring the bus up with [`driver::Epd::init`] and the controller with
//!    [`driver::Epd::hardware_init`]
//! 1. write a baseline with [`driver::Epd::clear`] or [`driver::Epd::load_base_map`]
//! 1. pack rendered pixels with [`crate::pack::pack`] and upload them with
//!    [`driver::Epd::draw_region`], optionally deferring the refresh and
//!    kicking it off once with [`driver::Epd::trigger_refresh`]
//!
//! All calls block, including the busy-line waits between controller
//! operations. Serialize access from a single task.

pub mod cmd;
pub mod driver;
pub mod error;
pub mod flag;
pub mod interface;
pub mod pins;
pub mod platform;
pub mod protocol;
pub mod waveform;
pub mod window;

pub use error::{DisplayError, Error, Result};

/// Display width, pixels horizontally
pub const WIDTH: u16 = 480;

/// Display height, pixels vertically
pub const HEIGHT: u16 = 800;

/// Size of one full frame in bytes
pub const BUFFER_SIZE: usize = WIDTH as usize * HEIGHT as usize / 8;

/// Largest single SPI transaction; longer writes are split
pub const MAX_TRANSFER_BYTES: usize = 4096;

/// Busy line polling interval
pub const BUSY_POLL_MS: u32 = 10;

/// Panel dimensions.
///
/// Width is in bits (pixels) and must be a non-zero multiple of 8, height is
/// in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
}

impl Geometry {
    /// The 480x800 panel this crate ships waveforms for
    pub const PANEL_480X800: Geometry = Geometry {
        width: WIDTH,
        height: HEIGHT,
    };

    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.width % 8 != 0 {
            return Err(Error::InvalidArgument("panel width must be a multiple of 8"));
        }
        if self.height == 0 {
            return Err(Error::InvalidArgument("panel height must be non-zero"));
        }
        Ok(())
    }

    /// Bytes in one full frame: `width * height / 8`
    pub const fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize / 8
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::PANEL_480X800
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_frame_is_48000_bytes() {
        assert_eq!(Geometry::PANEL_480X800.frame_bytes(), 48_000);
        assert_eq!(BUFFER_SIZE, 48_000);
    }

    #[test]
    fn geometry_rejects_unaligned_width() {
        assert!(matches!(
            Geometry::new(484, 10).validate(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Geometry::new(0, 10).validate(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Geometry::new(8, 0).validate(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(Geometry::new(8, 1).validate().is_ok());
    }
}
