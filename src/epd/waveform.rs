//! Waveform (LUT) tables
//!
//! Each blob is 112 bytes laid out as the controller expects them:
//!
//! | offset    | length | register | content                 |
//! |-----------|--------|----------|-------------------------|
//! | 0..105    | 105    | `0x32`   | voltage/timing LUT      |
//! | 105       | 1      | `0x03`   | gate driving voltage    |
//! | 106..109  | 3      | `0x04`   | source driving voltage  |
//! | 109       | 1      | `0x2C`   | VCOM                    |
//! | 110..112  | 2      | -        | reserved, never sent    |

/// Length of the main LUT segment sent with `0x32`
pub const MAIN_LUT_LEN: usize = 105;

/// Total blob length
pub const WAVEFORM_LEN: usize = 112;

const GATE_OFFSET: usize = 105;
const SOURCE_OFFSET: usize = 106;
const VCOM_OFFSET: usize = 109;
const RESERVED_OFFSET: usize = 110;

/// Refresh speed; picks which waveform a full-frame refresh loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshSpeed {
    /// Temperature-compensated waveform, best quality, visible flash
    #[default]
    Default,
    /// Fast waveform, used for partial updates
    Fast,
}

impl RefreshSpeed {
    pub fn from_fast_mode(fast_mode: bool) -> Self {
        if fast_mode {
            RefreshSpeed::Fast
        } else {
            RefreshSpeed::Default
        }
    }

    pub fn waveform(self) -> &'static Waveform {
        match self {
            RefreshSpeed::Default => &Waveform::DEFAULT,
            RefreshSpeed::Fast => &Waveform::FAST,
        }
    }
}

/// A waveform blob split into its register segments
#[derive(Debug, PartialEq, Eq)]
pub struct Waveform([u8; WAVEFORM_LEN]);

impl Waveform {
    /// Default waveform (20..80 frame range)
    pub const DEFAULT: Waveform = Waveform([
        0xA0, 0x48, 0x54, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x50, 0x48, 0xA8, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0xA0, 0x48, 0x54, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x50, 0x48, 0xA8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x1A, 0x14, 0x00, 0x00, 0x00, 0x0D, 0x01, 0x0D, 0x01, 0x02,
        0x0A, 0x0A, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x22, 0x22, 0x22, 0x22, 0x22,
        0x17, 0x41, 0xA8, 0x32, 0x48, 0x00, 0x00,
    ]);

    /// Fast waveform (80..127 frame range)
    pub const FAST: Waveform = Waveform([
        0xA8, 0x00, 0x55, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x54, 0x00, 0xAA, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0xA8, 0x00, 0x55, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x54, 0x00, 0xAA, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0D, 0x0B, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x0A, 0x0A, 0x05, 0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x22, 0x22, 0x22, 0x22, 0x22,
        0x17, 0x41, 0xA8, 0x32, 0x30, 0x00, 0x00,
    ]);

    pub fn as_bytes(&self) -> &[u8; WAVEFORM_LEN] {
        &self.0
    }

    pub fn main_lut(&self) -> &[u8] {
        &self.0[..MAIN_LUT_LEN]
    }

    pub fn gate(&self) -> &[u8] {
        &self.0[GATE_OFFSET..SOURCE_OFFSET]
    }

    pub fn source(&self) -> &[u8] {
        &self.0[SOURCE_OFFSET..VCOM_OFFSET]
    }

    pub fn vcom(&self) -> &[u8] {
        &self.0[VCOM_OFFSET..RESERVED_OFFSET]
    }

    pub fn reserved(&self) -> &[u8] {
        &self.0[RESERVED_OFFSET..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_cover_the_blob() {
        let w = &Waveform::DEFAULT;
        let total = w.main_lut().len()
            + w.gate().len()
            + w.source().len()
            + w.vcom().len()
            + w.reserved().len();
        assert_eq!(total, WAVEFORM_LEN);
    }

    #[test]
    fn trailing_registers_match_vendor_values() {
        assert_eq!(Waveform::DEFAULT.gate(), &[0x17]);
        assert_eq!(Waveform::DEFAULT.source(), &[0x41, 0xA8, 0x32]);
        assert_eq!(Waveform::DEFAULT.vcom(), &[0x48]);
        assert_eq!(Waveform::FAST.vcom(), &[0x30]);
    }

    #[test]
    fn speed_selects_table() {
        assert_eq!(RefreshSpeed::from_fast_mode(true).waveform(), &Waveform::FAST);
        assert_eq!(RefreshSpeed::from_fast_mode(false).waveform(), &Waveform::DEFAULT);
    }
}
