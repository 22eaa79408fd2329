//! Driver for a 480x800 1bpp e-paper panel with windowed partial refresh
//!
//! - [`epd`] talks to the panel controller: bring-up, full frames, partial
//!   windows and the waveform tables behind each refresh
//! - [`pack`] turns rendered RGB pixels into the panel's aligned, mirrored
//!   1bpp layout
//! - [`touch`] reads the FT6336 touch controller sitting next to the panel
//!
//! The controller side is generic over a [`epd::platform::Platform`]; on
//! ESP-IDF targets `epd::platform::EspPlatform` provides one.

pub mod epd;
pub mod pack;
pub mod touch;

pub use epd::driver::{DriverState, Epd, Region};
pub use epd::pins::{PanelConfig, Pins};
pub use epd::{Error, Geometry, Result};
pub use pack::{pack, pack_with_threshold, Canvas, Packed, PixelFormat, SourceRect};
