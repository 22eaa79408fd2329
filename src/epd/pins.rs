//! Pin definitions and bus configuration for the e-paper panel
//!
//! This module contains the board's GPIO pin assignments and the
//! [`PanelConfig`] handed to [`crate::epd::driver::Epd::init`].

use std::time::Duration;

use crate::epd::Geometry;

/// GPIO number as used by the platform; negative means "not connected"
pub type LineId = i32;

/// Line id for an unconnected pin
pub const NOT_CONNECTED: LineId = -1;

/// Bus clock used when the configuration leaves it at zero
pub const DEFAULT_CLOCK_HZ: u32 = 10_000_000;

/// Pin configuration constants for the display and touch panel on this board
pub struct Pins;

#[allow(dead_code)]
impl Pins {
    // SPI Display pins
    /// SPI Master Out Slave In
    pub const MOSI: LineId = 0;
    /// SPI Clock pin
    pub const SCK: LineId = 1;
    /// Chip Select pin for SPI display
    pub const CS: LineId = 21;
    /// Data/Command control pin (High for data, Low for command)
    pub const DC: LineId = 15;
    /// Reset pin for display
    pub const RST: LineId = 23;
    /// Busy status pin (High when display is busy)
    pub const BSY: LineId = 20;

    /// SPI clock the panel is run at on this board
    pub const CLOCK_HZ: u32 = 20_000_000;
}

/// SPI peripheral hosting the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusHost {
    #[default]
    Spi2,
    Spi3,
}

/// Bus and control-line assignment for one panel.
///
/// Immutable once handed to `init`; the driver keeps its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    pub host: BusHost,
    pub mosi: LineId,
    pub sclk: LineId,
    pub cs: LineId,
    pub dc: LineId,
    pub rst: LineId,
    pub busy: LineId,
    /// Bus clock in Hz, zero selects [`DEFAULT_CLOCK_HZ`]
    pub clock_hz: u32,
    pub geometry: Geometry,
    /// Upper bound for a single busy wait, `None` waits forever
    pub busy_timeout: Option<Duration>,
}

impl PanelConfig {
    /// Configuration with every line unconnected; fill in with the `with_*` methods
    pub const fn new() -> Self {
        Self {
            host: BusHost::Spi2,
            mosi: NOT_CONNECTED,
            sclk: NOT_CONNECTED,
            cs: NOT_CONNECTED,
            dc: NOT_CONNECTED,
            rst: NOT_CONNECTED,
            busy: NOT_CONNECTED,
            clock_hz: DEFAULT_CLOCK_HZ,
            geometry: Geometry::PANEL_480X800,
            busy_timeout: None,
        }
    }

    /// The wiring in [`Pins`]
    pub const fn board() -> Self {
        Self::new()
            .with_bus(BusHost::Spi2, Pins::MOSI, Pins::SCK)
            .with_control_lines(Pins::CS, Pins::DC, Pins::RST, Pins::BSY)
            .with_clock_hz(Pins::CLOCK_HZ)
    }

    pub const fn with_bus(mut self, host: BusHost, mosi: LineId, sclk: LineId) -> Self {
        self.host = host;
        self.mosi = mosi;
        self.sclk = sclk;
        self
    }

    pub const fn with_control_lines(
        mut self,
        cs: LineId,
        dc: LineId,
        rst: LineId,
        busy: LineId,
    ) -> Self {
        self.cs = cs;
        self.dc = dc;
        self.rst = rst;
        self.busy = busy;
        self
    }

    pub const fn with_clock_hz(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    pub const fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// Clock actually used on the bus
    pub const fn effective_clock_hz(&self) -> u32 {
        if self.clock_hz == 0 {
            DEFAULT_CLOCK_HZ
        } else {
            self.clock_hz
        }
    }

    /// Every line the driver needs, for range validation
    pub const fn lines(&self) -> [(&'static str, LineId); 6] {
        [
            ("mosi", self.mosi),
            ("sclk", self.sclk),
            ("cs", self.cs),
            ("dc", self.dc),
            ("rst", self.rst),
            ("busy", self.busy),
        ]
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::board()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_clock_falls_back_to_default() {
        let cfg = PanelConfig::board().with_clock_hz(0);
        assert_eq!(cfg.effective_clock_hz(), 10_000_000);
        assert_eq!(PanelConfig::board().effective_clock_hz(), 20_000_000);
    }

    #[test]
    fn board_config_uses_board_pins() {
        let cfg = PanelConfig::default();
        assert_eq!(cfg.busy, Pins::BSY);
        assert_eq!(cfg.dc, Pins::DC);
        assert_eq!(cfg.busy_timeout, None);
    }
}
