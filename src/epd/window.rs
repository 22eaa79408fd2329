//! RAM window addressing for partial updates

use crate::epd::{Error, Result};

/// Round `x` down to the controller's 8-pixel boundary
pub const fn align_down(x: u16) -> u16 {
    x - x % 8
}

/// A RAM sub-rectangle targeted by a partial update.
///
/// The field names follow the controller's own addressing model, which swaps
/// the axes: `columns` is the vertical extent (number of lines written) and
/// `rows` is the horizontal extent in bits. Keep it that way; the register
/// payloads below depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshWindow {
    pub x_start: u16,
    pub y_start: u16,
    pub columns: u16,
    pub rows: u16,
}

impl RefreshWindow {
    pub const fn new(x_start: u16, y_start: u16, columns: u16, rows: u16) -> Self {
        Self {
            x_start,
            y_start,
            columns,
            rows,
        }
    }

    /// Window for a bitmap `width_bits` wide and `height_rows` tall at (x, y)
    pub const fn for_bitmap(x: u16, y: u16, width_bits: u16, height_rows: u16) -> Self {
        Self::new(x, y, height_rows, width_bits)
    }

    pub const fn x_aligned(&self) -> u16 {
        align_down(self.x_start)
    }

    /// Last RAM X address: `x_aligned + rows - 1`
    pub fn x_end(&self) -> Result<u16> {
        self.rows
            .checked_sub(1)
            .and_then(|extent| self.x_aligned().checked_add(extent))
            .ok_or(Error::InvalidArgument("window exceeds the X address range"))
    }

    /// Last RAM Y address: `y_start + columns - 1`
    pub fn y_end(&self) -> Result<u16> {
        self.columns
            .checked_sub(1)
            .and_then(|extent| self.y_start.checked_add(extent))
            .ok_or(Error::InvalidArgument("window exceeds the Y address range"))
    }

    /// Bytes streamed into the window: `columns * rows / 8`
    pub const fn byte_len(&self) -> usize {
        self.columns as usize * self.rows as usize / 8
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.rows % 8 != 0 {
            return Err(Error::InvalidArgument("width must be a multiple of 8 bits"));
        }
        if self.columns == 0 {
            return Err(Error::InvalidArgument("height must be non-zero"));
        }
        self.x_end()?;
        self.y_end()?;
        Ok(())
    }
}
