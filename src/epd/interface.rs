//! Display interface using SPI
//!
//! [`BusChannel`] is everything the protocol needs from the transport: a
//! command/data select, byte transmission, the reset line, the busy line and a
//! blocking delay. [`SpiBus`] implements it on top of `embedded-hal` traits.
use display_interface::DisplayError;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::SpiDevice,
};

/// Logic level of a control line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Control lines driven by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLine {
    /// Data/Command select, low for commands
    DataCommand,
    /// Controller reset, active low
    Reset,
}

/// Byte-oriented transport to the panel controller.
///
/// Every call blocks until the transfer or line change has completed.
pub trait BusChannel {
    /// Send bytes in one transaction
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), DisplayError>;

    fn set_line(&mut self, line: OutputLine, level: Level) -> Result<(), DisplayError>;

    /// Busy line level, high while the controller is processing
    fn read_busy(&mut self) -> Result<Level, DisplayError>;

    fn delay_ms(&mut self, ms: u32);

    /// Following transmissions are opcodes
    fn command_mode(&mut self) -> Result<(), DisplayError> {
        self.set_line(OutputLine::DataCommand, Level::Low)
    }

    /// Following transmissions are payload
    fn data_mode(&mut self) -> Result<(), DisplayError> {
        self.set_line(OutputLine::DataCommand, Level::High)
    }
}

/// SPI connection to the panel
pub struct SpiBus<SPI, DC, RST, BSY, DELAY> {
    /// SPI device, chip select is handled by the device
    spi: SPI,
    /// Data/Command Control Pin (High for data, Low for command)
    dc: DC,
    /// Pin for Reseting
    rst: RST,
    /// High for busy, Wait until display is ready!
    busy: BSY,
    delay: DELAY,
}

impl<SPI, DC, RST, BSY, DELAY> SpiBus<SPI, DC, RST, BSY, DELAY> {
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BSY, delay: DELAY) -> Self {
        SpiBus {
            spi,
            dc,
            rst,
            busy,
            delay,
        }
    }

    /// Give the peripherals back
    pub fn release(self) -> (SPI, DC, RST, BSY, DELAY) {
        (self.spi, self.dc, self.rst, self.busy, self.delay)
    }
}

impl<SPI, DC, RST, BSY, DELAY> BusChannel for SpiBus<SPI, DC, RST, BSY, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BSY: InputPin,
    DELAY: DelayNs,
{
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        match self.spi.write(bytes) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("SPI write of {} bytes failed: {:?}", bytes.len(), e);
                Err(DisplayError::BusWriteError)
            }
        }
    }

    fn set_line(&mut self, line: OutputLine, level: Level) -> Result<(), DisplayError> {
        match line {
            OutputLine::DataCommand => match level {
                Level::Low => self.dc.set_low(),
                Level::High => self.dc.set_high(),
            }
            .map_err(|_| DisplayError::DCError),
            OutputLine::Reset => match level {
                Level::Low => self.rst.set_low(),
                Level::High => self.rst.set_high(),
            }
            .map_err(|_| DisplayError::RSError),
        }
    }

    fn read_busy(&mut self) -> Result<Level, DisplayError> {
        // display-interface has no busy variant, a failed read is reported like a DC fault
        self.busy
            .is_high()
            .map(Level::from)
            .map_err(|_| DisplayError::DCError)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
