//! Command sequencing for the panel controller
//!
//! [`Protocol`] owns an acquired [`BusChannel`] and knows the order in which
//! the controller expects its registers. It has no notion of lifecycle; the
//! public [`crate::epd::driver::Epd`] wraps it and only hands it out once the
//! bus is up.
//!
//! ## Critical Implementation Details
//!
//! ### Reset before every window
//!
//! This controller needs a hardware reset pulse before a RAM window can be
//! re-addressed for a partial update, see [`Protocol::write_window`].
//!
//! ### BUSY Pin Wait
//!
//! The busy line is polled every [`BUSY_POLL_MS`]. Without a configured
//! timeout the wait is unbounded; callers wanting a bound set
//! [`crate::epd::pins::PanelConfig::with_busy_timeout`].

use std::time::Duration;

use crate::epd::cmd::{Cmd, Command};
use crate::epd::flag::Flag;
use crate::epd::interface::{BusChannel, Level, OutputLine};
use crate::epd::waveform::{RefreshSpeed, Waveform};
use crate::epd::window::RefreshWindow;
use crate::epd::{Error, Geometry, Result, BUSY_POLL_MS, MAX_TRANSFER_BYTES};

/// Reset hold time, both edges
const RESET_HOLD_MS: u32 = 10;

/// Settle time after entering deep sleep
const DEEP_SLEEP_SETTLE_MS: u32 = 100;

/// Controller command sequencing over an acquired bus
pub struct Protocol<C> {
    bus: C,
    geometry: Geometry,
    busy_timeout: Option<Duration>,
}

impl<C> Protocol<C> {
    pub fn new(bus: C, geometry: Geometry, busy_timeout: Option<Duration>) -> Self {
        Self {
            bus,
            geometry,
            busy_timeout,
        }
    }

    pub fn bus(&self) -> &C {
        &self.bus
    }

    /// Hand the bus back for release
    pub fn into_bus(self) -> C {
        self.bus
    }
}

impl<C: BusChannel> Protocol<C> {
    // ==================== Bus primitives ====================

    /// Pulse the reset line low then high
    pub fn reset(&mut self) -> Result<()> {
        self.bus.set_line(OutputLine::Reset, Level::Low)?;
        self.bus.delay_ms(RESET_HOLD_MS);
        self.bus.set_line(OutputLine::Reset, Level::High)?;
        self.bus.delay_ms(RESET_HOLD_MS);
        Ok(())
    }

    /// Block until the busy line drops low
    pub fn wait_busy_low(&mut self) -> Result<()> {
        let max_polls = self
            .busy_timeout
            .map(|t| (t.as_millis() / u128::from(BUSY_POLL_MS)).max(1));
        let mut polls: u128 = 0;

        loop {
            if self.bus.read_busy()? == Level::Low {
                return Ok(());
            }
            if let Some(max) = max_polls {
                if polls >= max {
                    log::error!("Busy line still high after {} polls", polls);
                    return Err(Error::Timeout);
                }
            }
            polls += 1;
            self.bus.delay_ms(BUSY_POLL_MS);
        }
    }

    /// Send an opcode and its literal payload
    pub fn send(&mut self, command: &Command) -> Result<()> {
        self.send_opcode(command.opcode())?;
        self.send_data(command.payload())
    }

    fn send_opcode(&mut self, opcode: u8) -> Result<()> {
        self.bus.command_mode()?;
        self.bus.transmit(&[opcode]).map_err(|e| {
            log::error!("Command 0x{:02X} failed", opcode);
            Error::from(e)
        })
    }

    /// Stream data with DC high, split into [`MAX_TRANSFER_BYTES`] transactions
    fn send_data(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.bus.data_mode()?;
        for chunk in data.chunks(MAX_TRANSFER_BYTES) {
            self.bus.transmit(chunk)?;
        }
        Ok(())
    }

    /// Stream `count` copies of `byte` with DC high
    fn send_repeated(&mut self, byte: u8, count: usize) -> Result<()> {
        let buffer = vec![byte; count.min(MAX_TRANSFER_BYTES)];
        self.bus.data_mode()?;

        let mut remaining = count;
        while remaining > 0 {
            let chunk = remaining.min(buffer.len());
            self.bus.transmit(&buffer[..chunk])?;
            remaining -= chunk;
        }
        log::debug!("Completed sending {} bytes of 0x{:02X}", count, byte);
        Ok(())
    }

    // ==================== Sequences ====================

    /// Bring the controller from power-up to a clean, addressable state
    pub fn hardware_init(&mut self) -> Result<()> {
        log::info!("Initializing e-paper controller");

        self.reset()?;
        self.wait_busy_low()?;

        self.send(&Command::soft_reset())?;
        self.wait_busy_low()?;

        let geometry = self.geometry;
        let setup = [
            Command::temperature_sensor(Flag::INTERNAL_TEMP_SENSOR),
            Command::booster_soft_start(),
            Command::driver_output(geometry),
            Command::border_waveform(Flag::BORDER_WAVEFORM_LUT1),
            Command::data_entry_mode(Flag::DATA_ENTRY_INCRY_INCRX),
        ];
        for command in &setup {
            self.send(command)?;
        }
        self.set_full_ram_window()?;
        self.wait_busy_low()?;

        self.send(&Command::temperature_register(
            Flag::TEMP_REGISTER_CLEAN_START,
        ))?;
        self.send(&Command::update_control(Flag::DISPLAY_UPDATE_CLEAN_START))?;
        self.send(&Command::master_activate())?;
        self.wait_busy_low()?;

        log::info!("Controller ready");
        Ok(())
    }

    /// Full RAM extents and counters at the origin.
    ///
    /// The X extent spans the panel height and the Y extent its width; the
    /// controller's gate/source mapping on this panel runs that way round.
    fn set_full_ram_window(&mut self) -> Result<()> {
        let Geometry { width, height } = self.geometry;
        let commands = [
            Command::ram_x_window(0, height - 1),
            Command::ram_y_window(0, width - 1),
            Command::ram_x_counter(0),
            Command::ram_y_counter(0),
        ];
        for command in &commands {
            self.send(command)?;
        }
        Ok(())
    }

    /// Fill the whole frame with `fill` and run a full refresh
    pub fn clear(&mut self, fill: u8) -> Result<()> {
        log::info!("Clearing frame with 0x{:02X}", fill);
        self.set_full_ram_window()?;
        self.send_opcode(Cmd::WRITE_BW_DATA)?;
        self.send_repeated(fill, self.geometry.frame_bytes())?;
        self.full_refresh(RefreshSpeed::Default)
    }

    /// Write `frame` into both RAM planes and refresh with the chosen waveform
    pub fn load_base_map(&mut self, frame: &[u8], speed: RefreshSpeed) -> Result<()> {
        if frame.len() != self.geometry.frame_bytes() {
            return Err(Error::InvalidArgument("base map must be exactly one frame"));
        }
        log::info!("Loading base map ({} bytes, {:?})", frame.len(), speed);

        self.send_opcode(Cmd::WRITE_BW_DATA)?;
        self.send_data(frame)?;
        self.send_opcode(Cmd::WRITE_OLD_DATA)?;
        self.send_data(frame)?;

        self.full_refresh(speed)
    }

    /// Address `window` and stream `bits` into it, without refreshing.
    ///
    /// The controller is reset first; it will not accept a new window otherwise.
    pub fn write_window(&mut self, window: &RefreshWindow, bits: &[u8]) -> Result<()> {
        window.validate()?;
        if bits.len() != window.byte_len() {
            return Err(Error::InvalidArgument(
                "bitmap length does not match the window",
            ));
        }

        let x_aligned = window.x_aligned();
        let x_end = window.x_end()?;
        let y_end = window.y_end()?;
        log::debug!(
            "Partial window x {}..={} y {}..={} ({} bytes)",
            x_aligned,
            x_end,
            window.y_start,
            y_end,
            bits.len()
        );

        self.reset()?;

        let commands = [
            Command::temperature_sensor(Flag::INTERNAL_TEMP_SENSOR),
            Command::border_waveform(Flag::BORDER_WAVEFORM_VCOM),
            Command::ram_x_window(x_aligned, x_end),
            Command::ram_y_window(window.y_start, y_end),
            Command::ram_x_counter(x_aligned),
            Command::ram_y_counter(window.y_start),
        ];
        for command in &commands {
            self.send(command)?;
        }

        self.send_opcode(Cmd::WRITE_BW_DATA)?;
        self.send_data(bits)
    }

    /// Load a waveform: main LUT, busy wait, then the trailing voltage registers
    pub fn load_waveform(&mut self, waveform: &Waveform) -> Result<()> {
        log::debug!("Setting LUT data");
        self.send_opcode(Cmd::WRITE_LUT_REGISTER)?;
        self.send_data(waveform.main_lut())?;
        self.wait_busy_low()?;

        // register-only writes, the controller does not raise busy for these
        self.send_opcode(Cmd::GATE_VOLTAGE_CONTROL)?;
        self.send_data(waveform.gate())?;
        self.send_opcode(Cmd::SOURCE_VOLTAGE_CONTROL)?;
        self.send_data(waveform.source())?;
        self.send_opcode(Cmd::WRITE_VCOM_REGISTER)?;
        self.send_data(waveform.vcom())
    }

    /// Full refresh of the whole panel
    pub fn full_refresh(&mut self, speed: RefreshSpeed) -> Result<()> {
        self.load_waveform(speed.waveform())?;
        self.trigger(Flag::DISPLAY_UPDATE_FULL)
    }

    /// Partial refresh from the fast waveform
    pub fn partial_refresh(&mut self) -> Result<()> {
        self.load_waveform(RefreshSpeed::Fast.waveform())?;
        self.trigger(Flag::DISPLAY_UPDATE_PARTIAL)
    }

    fn trigger(&mut self, sequence: u8) -> Result<()> {
        self.send(&Command::update_control(sequence))?;
        self.send(&Command::master_activate())?;
        self.wait_busy_low()
    }

    pub fn deep_sleep(&mut self) -> Result<()> {
        log::info!("Entering deep sleep");
        self.send(&Command::deep_sleep())?;
        self.bus.delay_ms(DEEP_SLEEP_SETTLE_MS);
        Ok(())
    }
}
