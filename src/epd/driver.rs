//! E-paper Display Driver Implementation
//!
//! [`Epd`] is the caller-facing handle. It owns the [`Platform`] that hands
//! out the bus, tracks whether the bus is up, and forwards every panel
//! operation to [`Protocol`] once it is.
//!
//! ## Architecture
//!
//! ### Lifecycle Functions
//! - `init()` - Validate the configuration and acquire the bus
//! - `deinit()` - Release the bus, also run on drop
//!
//! ### Full Frame Functions
//! - `hardware_init()` - Controller power-up sequence
//! - `clear()` - Fill the frame and run a full refresh
//! - `load_base_map()` - Write a baseline image into both RAM planes
//!
//! ### Partial Update Functions
//! - `draw_region()` / `draw_packed()` - Upload one window, optionally deferring the refresh
//! - `draw_regions()` - Upload several windows under one refresh
//! - `trigger_refresh()` - Run a pending partial refresh
//!
//! ### Power Management
//! - `deep_sleep()` - Enter deep sleep, a hardware reset wakes it

use crate::epd::pins::PanelConfig;
use crate::epd::platform::Platform;
use crate::epd::protocol::Protocol;
use crate::epd::waveform::RefreshSpeed;
use crate::epd::window::RefreshWindow;
use crate::epd::{Error, Result};
use crate::pack::Packed;

/// Externally visible driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Ready,
}

/// A bitmap and where it goes, for [`Epd::draw_regions`]
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    pub x: u16,
    pub y: u16,
    /// Width in bits, a multiple of 8
    pub width_bits: u16,
    pub height_rows: u16,
    /// `width_bits * height_rows / 8` bytes, MSB first, bit 1 = white
    pub bits: &'a [u8],
}

impl<'a> Region<'a> {
    pub const fn new(x: u16, y: u16, width_bits: u16, height_rows: u16, bits: &'a [u8]) -> Self {
        Self {
            x,
            y,
            width_bits,
            height_rows,
            bits,
        }
    }

    fn window(&self) -> RefreshWindow {
        RefreshWindow::for_bitmap(self.x, self.y, self.width_bits, self.height_rows)
    }
}

/// E-paper panel driver
///
/// ## Type Parameters
///
/// - `P` - platform providing the bus channel
pub struct Epd<P: Platform> {
    platform: P,
    protocol: Option<Protocol<P::Channel>>,
    config: Option<PanelConfig>,
}

impl<P: Platform> Epd<P> {
    /// Create an uninitialised driver; nothing touches the hardware yet
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            protocol: None,
            config: None,
        }
    }

    pub fn state(&self) -> DriverState {
        if self.protocol.is_some() {
            DriverState::Ready
        } else {
            DriverState::Uninitialized
        }
    }

    /// Configuration the driver was initialised with
    pub fn config(&self) -> Option<&PanelConfig> {
        self.config.as_ref()
    }

    // ==================== Lifecycle ====================

    /// Validate `config`, set up the control lines and open the bus
    pub fn init(&mut self, config: PanelConfig) -> Result<()> {
        if self.protocol.is_some() {
            return Err(Error::InvalidState("driver already initialised"));
        }

        let limit = self.platform.line_limit();
        for (name, line) in config.lines() {
            if !(0..limit).contains(&line) {
                log::error!("{} line {} outside 0..{}", name, line, limit);
                return Err(Error::InvalidArgument("line id out of range"));
            }
        }
        config.geometry.validate()?;

        let channel = self.platform.acquire(&config)?;
        log::info!(
            "EPD bus acquired: {}x{} panel, {} Hz",
            config.geometry.width,
            config.geometry.height,
            config.effective_clock_hz()
        );

        self.protocol = Some(Protocol::new(
            channel,
            config.geometry,
            config.busy_timeout,
        ));
        self.config = Some(config);
        Ok(())
    }

    /// Release the bus. Safe to call when not initialised.
    pub fn deinit(&mut self) {
        if let Some(protocol) = self.protocol.take() {
            self.platform.release(protocol.into_bus());
            self.config = None;
            log::info!("EPD bus released");
        }
    }

    fn ready(&mut self) -> Result<&mut Protocol<P::Channel>> {
        self.protocol
            .as_mut()
            .ok_or(Error::InvalidState("driver not initialised"))
    }

    // ==================== Full frame ====================

    /// Run the controller power-up sequence.
    ///
    /// `fast_mode` is accepted for symmetry with [`Self::load_base_map`]; both
    /// speeds share the same sequence.
    pub fn hardware_init(&mut self, fast_mode: bool) -> Result<()> {
        log::debug!("hardware_init(fast_mode = {})", fast_mode);
        self.ready()?.hardware_init()
    }

    pub fn clear(&mut self, fill: u8) -> Result<()> {
        self.ready()?.clear(fill)
    }

    /// Write a full frame into both RAM planes and refresh
    pub fn load_base_map(&mut self, frame: &[u8], fast_mode: bool) -> Result<()> {
        self.ready()?
            .load_base_map(frame, RefreshSpeed::from_fast_mode(fast_mode))
    }

    // ==================== Partial updates ====================

    /// Upload a bitmap to (x, y); `x` is aligned down to a multiple of 8.
    ///
    /// With `defer_refresh` the panel is not refreshed; call
    /// [`Self::trigger_refresh`] after the last region.
    pub fn draw_region(
        &mut self,
        x: u16,
        y: u16,
        bits: &[u8],
        width_bits: u16,
        height_rows: u16,
        defer_refresh: bool,
    ) -> Result<()> {
        let window = RefreshWindow::for_bitmap(x, y, width_bits, height_rows);
        self.draw_window(&window, bits, defer_refresh)
    }

    /// Upload every region, then run a single partial refresh
    pub fn draw_regions(&mut self, regions: &[Region<'_>]) -> Result<()> {
        let protocol = self.ready()?;
        for region in regions {
            protocol.write_window(&region.window(), region.bits)?;
        }
        if regions.is_empty() {
            return Ok(());
        }
        protocol.partial_refresh()
    }

    /// Upload the output of [`crate::pack::pack`]
    pub fn draw_packed(&mut self, packed: &Packed, defer_refresh: bool) -> Result<()> {
        self.draw_window(&packed.window, &packed.bytes, defer_refresh)
    }

    fn draw_window(&mut self, window: &RefreshWindow, bits: &[u8], defer: bool) -> Result<()> {
        let protocol = self.ready()?;
        protocol.write_window(window, bits)?;
        if !defer {
            protocol.partial_refresh()?;
        }
        Ok(())
    }

    /// Partial refresh of whatever has been uploaded since the last one
    pub fn trigger_refresh(&mut self) -> Result<()> {
        self.ready()?.partial_refresh()
    }

    // ==================== Power ====================

    pub fn deep_sleep(&mut self) -> Result<()> {
        self.ready()?.deep_sleep()
    }
}

impl<P: Platform> Drop for Epd<P> {
    fn drop(&mut self) {
        self.deinit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epd::cmd::Cmd;
    use crate::epd::flag::Flag;
    use crate::epd::interface::{Level, OutputLine};
    use crate::epd::pins::{PanelConfig, NOT_CONNECTED};
    use crate::epd::platform::fake::{Event, FakePlatform};
    use crate::epd::Geometry;
    use std::time::Duration;

    fn ready_driver() -> (Epd<FakePlatform>, FakePlatform) {
        let platform = FakePlatform::default();
        let mut epd = Epd::new(platform.clone());
        epd.init(PanelConfig::board()).unwrap();
        (epd, platform)
    }

    #[test]
    fn init_rejects_out_of_range_busy_line() {
        let platform = FakePlatform::default();
        let mut epd = Epd::new(platform.clone());
        let config = PanelConfig::board().with_control_lines(21, 15, 23, 99);

        assert!(matches!(epd.init(config), Err(Error::InvalidArgument(_))));
        assert_eq!(epd.state(), DriverState::Uninitialized);
        assert_eq!(platform.log.borrow().acquired, 0);
    }

    #[test]
    fn init_rejects_unconnected_line_and_bad_geometry() {
        let mut epd = Epd::new(FakePlatform::default());
        let unconnected = PanelConfig::board().with_control_lines(21, NOT_CONNECTED, 23, 20);
        assert!(matches!(epd.init(unconnected), Err(Error::InvalidArgument(_))));

        let odd = PanelConfig::board().with_geometry(Geometry::new(481, 800));
        assert!(matches!(epd.init(odd), Err(Error::InvalidArgument(_))));
        assert_eq!(epd.state(), DriverState::Uninitialized);
    }

    #[test]
    fn second_init_is_invalid_state() {
        let (mut epd, platform) = ready_driver();
        assert_eq!(epd.state(), DriverState::Ready);
        assert!(matches!(
            epd.init(PanelConfig::board()),
            Err(Error::InvalidState(_))
        ));
        assert_eq!(platform.log.borrow().acquired, 1);
    }

    #[test]
    fn operations_before_init_are_invalid_state() {
        let mut epd = Epd::new(FakePlatform::default());
        assert!(matches!(epd.hardware_init(false), Err(Error::InvalidState(_))));
        assert!(matches!(epd.clear(0xFF), Err(Error::InvalidState(_))));
        assert!(matches!(epd.trigger_refresh(), Err(Error::InvalidState(_))));
        assert!(matches!(
            epd.draw_region(0, 0, &[0xFF], 8, 1, false),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(epd.deep_sleep(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn deinit_is_idempotent_and_drop_releases() {
        let (mut epd, platform) = ready_driver();
        epd.deinit();
        epd.deinit();
        assert_eq!(epd.state(), DriverState::Uninitialized);
        assert_eq!(platform.log.borrow().released, 1);

        epd.init(PanelConfig::board()).unwrap();
        drop(epd);
        assert_eq!(platform.log.borrow().released, 2);
    }

    #[test]
    fn clear_streams_a_full_frame_in_twelve_chunks() {
        let (mut epd, platform) = ready_driver();
        epd.clear(Flag::FILL_WHITE).unwrap();

        let log = platform.log.borrow();
        let start = log
            .events
            .iter()
            .position(|e| *e == Event::Command(Cmd::WRITE_BW_DATA))
            .unwrap();
        let chunks: Vec<usize> = log.events[start + 1..]
            .iter()
            .take_while(|e| matches!(e, Event::Data(_)))
            .map(|e| match e {
                Event::Data(bytes) => bytes.len(),
                _ => 0,
            })
            .collect();

        assert_eq!(chunks.len(), 12);
        assert_eq!(chunks.iter().sum::<usize>(), 48_000);
        assert_eq!(log.count(Cmd::MASTER_ACTIVATE), 1);
        assert_eq!(log.count(Cmd::WRITE_LUT_REGISTER), 1);
    }

    #[test]
    fn deferred_draws_share_one_refresh() {
        let (mut epd, platform) = ready_driver();
        let glyph = [0x00u8; 16 * 4 / 8];

        epd.draw_region(10, 20, &glyph, 16, 4, true).unwrap();
        epd.draw_region(100, 20, &glyph, 16, 4, true).unwrap();
        assert_eq!(platform.log.borrow().count(Cmd::MASTER_ACTIVATE), 0);

        epd.trigger_refresh().unwrap();
        let log = platform.log.borrow();
        assert_eq!(log.count(Cmd::WRITE_BW_DATA), 2);
        assert_eq!(log.count(Cmd::WRITE_LUT_REGISTER), 1);
        assert_eq!(log.count(Cmd::MASTER_ACTIVATE), 1);
    }

    #[test]
    fn draw_regions_refreshes_once() {
        let (mut epd, platform) = ready_driver();
        let bits = [0xAAu8; 4];
        let regions = [
            Region::new(0, 0, 8, 4, &bits),
            Region::new(64, 8, 16, 2, &bits),
            Region::new(200, 300, 32, 1, &bits),
        ];
        epd.draw_regions(&regions).unwrap();

        let log = platform.log.borrow();
        assert_eq!(log.count(Cmd::WRITE_BW_DATA), 3);
        assert_eq!(log.count(Cmd::MASTER_ACTIVATE), 1);
    }

    #[test]
    fn draw_region_rejects_mismatched_bitmap() {
        let (mut epd, platform) = ready_driver();
        assert!(matches!(
            epd.draw_region(0, 0, &[0u8; 3], 16, 2, false),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            epd.draw_region(0, 0, &[0u8; 2], 12, 1, false),
            Err(Error::InvalidArgument(_))
        ));
        assert!(platform.log.borrow().events.is_empty());
    }

    #[test]
    fn undeferred_draw_refreshes_immediately() {
        let (mut epd, platform) = ready_driver();
        epd.draw_region(3, 5, &[0x0F, 0xF0], 16, 1, false).unwrap();

        let log = platform.log.borrow();
        assert_eq!(
            log.events.first(),
            Some(&Event::Line(OutputLine::Reset, Level::Low))
        );
        assert_eq!(log.count(Cmd::MASTER_ACTIVATE), 1);
        assert!(log.events.contains(&Event::Data(vec![0x0F, 0xF0])));
    }

    #[test]
    fn configured_busy_timeout_surfaces() {
        let platform = FakePlatform::default();
        platform
            .log
            .borrow_mut()
            .busy_script
            .extend([Level::High; 10]);
        let mut epd = Epd::new(platform.clone());
        let config = PanelConfig::board().with_busy_timeout(Duration::from_millis(30));
        epd.init(config).unwrap();

        assert!(matches!(epd.hardware_init(false), Err(Error::Timeout)));
        let log = platform.log.borrow();
        let reads = log.events.iter().filter(|e| **e == Event::BusyRead).count();
        assert_eq!(reads, 4);
        assert!(log.commands().is_empty());
    }
}
