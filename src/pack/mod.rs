//! Conversion of rendered pixels into panel bitmaps
//!
//! The panel takes 1 bit per pixel, rows padded to whole bytes, with the
//! horizontal scan direction mirrored relative to a normal image. [`pack`]
//! turns a rectangle of RGB pixels into exactly that, together with the
//! [`RefreshWindow`] it has to be written to.
//!
//! Packing has no hardware dependency and no state; it can run on any thread.

pub mod canvas;

pub use canvas::Canvas;

use crate::epd::window::{align_down, RefreshWindow};
use crate::epd::{Error, Result};

/// Luminance threshold on the 0..=255 scale used by [`pack`]
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Source pixel encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16-bit 5-6-5, little-endian
    Rgb565,
    /// 16-bit 5-6-5, big-endian
    ///
    /// The vendor LVGL flush path decodes this the same as [`PixelFormat::Rgb565`];
    /// here the two byte orders are kept distinct.
    Rgb565Swapped,
    /// Blue, green, red bytes
    Bgr888,
    /// Blue, green, red, alpha bytes; alpha is ignored
    Bgra8888,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb565 | PixelFormat::Rgb565Swapped => 2,
            PixelFormat::Bgr888 => 3,
            PixelFormat::Bgra8888 => 4,
        }
    }

    /// 8-bit red, green, blue of the pixel starting at `p[0]`
    fn decode(self, p: &[u8]) -> (u8, u8, u8) {
        match self {
            PixelFormat::Rgb565 => expand_565(u16::from_le_bytes([p[0], p[1]])),
            PixelFormat::Rgb565Swapped => expand_565(u16::from_be_bytes([p[0], p[1]])),
            PixelFormat::Bgr888 | PixelFormat::Bgra8888 => (p[2], p[1], p[0]),
        }
    }
}

fn expand_565(value: u16) -> (u8, u8, u8) {
    let r = u32::from((value >> 11) & 0x1F) * 255 / 31;
    let g = u32::from((value >> 5) & 0x3F) * 255 / 63;
    let b = u32::from(value & 0x1F) * 255 / 31;
    (r as u8, g as u8, b as u8)
}

/// Luminance scaled by 100: `30R + 59G + 11B`
fn luminance(r: u8, g: u8, b: u8) -> u32 {
    30 * u32::from(r) + 59 * u32::from(g) + 11 * u32::from(b)
}

/// A rectangle of source pixels and where it lands on the panel.
///
/// `data` starts at the rectangle's top-left pixel; consecutive rows are
/// `stride` bytes apart.
#[derive(Debug, Clone, Copy)]
pub struct SourceRect<'a> {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub stride: usize,
    pub data: &'a [u8],
}

impl<'a> SourceRect<'a> {
    /// Tightly packed rows, `stride = width * bytes_per_pixel`
    pub fn new(x: u16, y: u16, width: u16, height: u16, format: PixelFormat, data: &'a [u8]) -> Self {
        Self {
            x,
            y,
            width,
            height,
            stride: usize::from(width) * format.bytes_per_pixel(),
            data,
        }
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    fn validate(&self, format: PixelFormat) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidArgument("source rectangle is empty"));
        }
        let row_bytes = usize::from(self.width) * format.bytes_per_pixel();
        if self.stride < row_bytes {
            return Err(Error::InvalidArgument("stride shorter than a row"));
        }
        let needed = self
            .stride
            .checked_mul(usize::from(self.height) - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or(Error::InvalidArgument("source rectangle exceeds addressable memory"))?;
        if self.data.len() < needed {
            return Err(Error::InvalidArgument("source data too short"));
        }
        Ok(())
    }
}

/// Packed bitmap ready for [`crate::epd::driver::Epd::draw_packed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packed {
    pub window: RefreshWindow,
    /// MSB first, bit 1 = white
    pub bytes: Vec<u8>,
    /// Pixels classified as ink
    pub ink_pixels: usize,
}

/// [`pack_with_threshold`] at [`DEFAULT_THRESHOLD`]
pub fn pack(source: &SourceRect<'_>, format: PixelFormat) -> Result<Packed> {
    pack_with_threshold(source, format, DEFAULT_THRESHOLD)
}

/// Convert `source` to a 1bpp bitmap aligned to the controller's 8-pixel grid.
///
/// The window starts at `x` rounded down to a multiple of 8; the columns this
/// adds on the left, and whatever is needed to complete the last byte on the
/// right, stay white. A pixel is ink when its luminance is below
/// `threshold * 100`.
pub fn pack_with_threshold(
    source: &SourceRect<'_>,
    format: PixelFormat,
    threshold: u8,
) -> Result<Packed> {
    source.validate(format)?;

    let aligned_x = align_down(source.x);
    let pad = usize::from(source.x - aligned_x);
    let width = usize::from(source.width);
    let height = usize::from(source.height);
    let aligned_width = (width + pad).div_ceil(8) * 8;
    let rows = u16::try_from(aligned_width)
        .map_err(|_| Error::InvalidArgument("aligned width exceeds 16 bits"))?;

    let bpp = format.bytes_per_pixel();
    let limit = u32::from(threshold) * 100;
    let mut bytes = vec![0xFF; (aligned_width * height).div_ceil(8)];
    let mut ink_pixels = 0;

    for row in 0..height {
        let line = &source.data[row * source.stride..];
        for col in 0..width {
            let (r, g, b) = format.decode(&line[col * bpp..]);
            if luminance(r, g, b) >= limit {
                continue;
            }
            let index = row * aligned_width + pad + (width - 1 - col);
            bytes[index / 8] &= !(0x80 >> (index % 8));
            ink_pixels += 1;
        }
    }

    log::debug!(
        "Packed {}x{} at ({}, {}) into {} bytes, {} ink pixels",
        width,
        height,
        source.x,
        source.y,
        bytes.len(),
        ink_pixels
    );

    Ok(Packed {
        window: RefreshWindow::new(aligned_x, source.y, source.height, rows),
        bytes,
        ink_pixels,
    })
}
