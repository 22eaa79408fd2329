//! RGB565 drawing surface for `embedded-graphics`
//!
//! Render into a [`Canvas`] with any `embedded-graphics` primitive, then hand
//! the area that changed to [`crate::pack::pack`] via [`Canvas::source`].
//! A canvas can cover just part of the panel; its origin places it.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::epd::{Error, Geometry, Result};
use crate::pack::{PixelFormat, SourceRect};

const BYTES_PER_PIXEL: usize = 2;

/// Little-endian RGB565 frame covering all or part of the panel
pub struct Canvas {
    width: u16,
    height: u16,
    /// Panel position of the canvas' top-left pixel
    origin: (u16, u16),
    buffer: Vec<u8>,
}

impl Canvas {
    /// A white canvas of `width` x `height` pixels
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            origin: (0, 0),
            buffer: vec![0xFF; usize::from(width) * usize::from(height) * BYTES_PER_PIXEL],
        }
    }

    pub fn for_geometry(geometry: Geometry) -> Self {
        Self::new(geometry.width, geometry.height)
    }

    /// Place the canvas at panel position (x, y)
    pub fn with_origin(mut self, x: u16, y: u16) -> Self {
        self.origin = (x, y);
        self
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    fn stride(&self) -> usize {
        usize::from(self.width) * BYTES_PER_PIXEL
    }

    /// The whole canvas, ready for packing
    pub fn full_source(&self) -> Result<SourceRect<'_>> {
        self.source(self.bounding_box())
    }

    /// The part of `area` inside the canvas, ready for packing.
    ///
    /// `area` is in canvas coordinates; the returned rectangle is placed on
    /// the panel by the canvas origin.
    pub fn source(&self, area: Rectangle) -> Result<SourceRect<'_>> {
        let clipped = area.intersection(&self.bounding_box());
        if clipped.is_zero_sized() {
            return Err(Error::InvalidArgument("area lies outside the canvas"));
        }

        // the intersection is inside the canvas, so every value fits in u16
        let x = clipped.top_left.x as u16;
        let y = clipped.top_left.y as u16;
        let offset = usize::from(y) * self.stride() + usize::from(x) * BYTES_PER_PIXEL;

        let (origin_x, origin_y) = self.origin;
        let panel_x = origin_x
            .checked_add(x)
            .ok_or(Error::InvalidArgument("area exceeds the panel address range"))?;
        let panel_y = origin_y
            .checked_add(y)
            .ok_or(Error::InvalidArgument("area exceeds the panel address range"))?;

        Ok(SourceRect::new(
            panel_x,
            panel_y,
            clipped.size.width as u16,
            clipped.size.height as u16,
            PixelFormat::Rgb565,
            &self.buffer[offset..],
        )
        .with_stride(self.stride()))
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = (i32::from(self.width), i32::from(self.height));
        let stride = self.stride();
        for Pixel(point, color) in pixels {
            if !(0..width).contains(&point.x) || !(0..height).contains(&point.y) {
                continue;
            }
            let offset = point.y as usize * stride + point.x as usize * BYTES_PER_PIXEL;
            self.buffer[offset..offset + BYTES_PER_PIXEL]
                .copy_from_slice(&color.into_storage().to_le_bytes());
        }
        Ok(())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(u32::from(self.width), u32::from(self.height))
    }
}
