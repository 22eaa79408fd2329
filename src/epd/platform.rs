//! Acquiring the panel's bus from a [`PanelConfig`]
//!
//! A [`Platform`] knows which line numbers exist on the chip and how to turn a
//! configuration into a ready [`BusChannel`]. On ESP-IDF targets
//! [`EspPlatform`] does this with `esp-idf-svc` drivers; tests provide their
//! own.

use display_interface::DisplayError;

use crate::epd::interface::BusChannel;
use crate::epd::pins::{BusHost, LineId, PanelConfig};

/// Source of bus channels for the driver
pub trait Platform {
    type Channel: BusChannel;

    /// Exclusive upper bound for line ids; valid ids are `0..line_limit()`
    fn line_limit(&self) -> LineId;

    /// Configure DC and RST as outputs driven high, BUSY as a pulled-up
    /// input, and open the bus at `config.effective_clock_hz()`
    fn acquire(&mut self, config: &PanelConfig) -> Result<Self::Channel, DisplayError>;

    /// Tear the bus down again
    fn release(&mut self, channel: Self::Channel) {
        drop(channel);
    }
}

/// The board only routes the panel to SPI2; reject anything else before any
/// line is touched
#[cfg_attr(not(any(target_os = "espidf", test)), allow(dead_code))]
fn check_host(host: BusHost) -> Result<(), DisplayError> {
    if host != BusHost::Spi2 {
        log::error!("{:?} is not available, the panel needs SPI2", host);
        return Err(DisplayError::BusWriteError);
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub use esp::{EspChannel, EspPlatform};

#[cfg(target_os = "espidf")]
mod esp {
    use display_interface::DisplayError;
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, Output, PinDriver, Pull};
    use esp_idf_svc::hal::prelude::*;
    use esp_idf_svc::hal::spi::{self, Dma, SpiDeviceDriver, SpiDriver, SpiDriverConfig, SPI2};
    use esp_idf_svc::sys::{gpio_num_t_GPIO_NUM_MAX, EspError};

    use super::{check_host, Platform};
    use crate::epd::interface::SpiBus;
    use crate::epd::pins::{LineId, PanelConfig};
    use crate::epd::MAX_TRANSFER_BYTES;

    /// Bus channel built from ESP-IDF drivers
    pub type EspChannel = SpiBus<
        SpiDeviceDriver<'static, SpiDriver<'static>>,
        PinDriver<'static, AnyOutputPin, Output>,
        PinDriver<'static, AnyOutputPin, Output>,
        PinDriver<'static, AnyIOPin, Input>,
        FreeRtos,
    >;

    /// ESP-IDF GPIO and SPI master drivers
    #[derive(Default)]
    pub struct EspPlatform;

    impl EspPlatform {
        pub fn new() -> Self {
            EspPlatform
        }
    }

    fn bus_error(what: &str, e: EspError) -> DisplayError {
        log::error!("{} failed: {}", what, e);
        DisplayError::BusWriteError
    }

    fn line_error(what: &str, e: EspError, err: DisplayError) -> DisplayError {
        log::error!("{} failed: {}", what, e);
        err
    }

    impl Platform for EspPlatform {
        type Channel = EspChannel;

        fn line_limit(&self) -> LineId {
            gpio_num_t_GPIO_NUM_MAX as LineId
        }

        fn acquire(&mut self, config: &PanelConfig) -> Result<EspChannel, DisplayError> {
            check_host(config.host)?;

            // SAFETY: init() validated every id against GPIO_NUM_MAX and the driver
            // owns these lines exclusively until release()
            let (dc, rst, busy, mosi, sclk, cs) = unsafe {
                (
                    AnyOutputPin::new(config.dc),
                    AnyOutputPin::new(config.rst),
                    AnyIOPin::new(config.busy),
                    AnyIOPin::new(config.mosi),
                    AnyIOPin::new(config.sclk),
                    AnyIOPin::new(config.cs),
                )
            };

            let mut dc = PinDriver::output(dc)
                .map_err(|e| line_error("dc gpio config", e, DisplayError::DCError))?;
            dc.set_high()
                .map_err(|e| line_error("dc gpio level", e, DisplayError::DCError))?;
            let mut rst = PinDriver::output(rst)
                .map_err(|e| line_error("rst gpio config", e, DisplayError::RSError))?;
            rst.set_high()
                .map_err(|e| line_error("rst gpio level", e, DisplayError::RSError))?;
            let mut busy = PinDriver::input(busy)
                .map_err(|e| line_error("busy gpio config", e, DisplayError::DCError))?;
            busy.set_pull(Pull::Up)
                .map_err(|e| line_error("busy gpio pull", e, DisplayError::DCError))?;

            let driver_config = SpiDriverConfig::new().dma(Dma::Auto(MAX_TRANSFER_BYTES));
            // SAFETY: SPI2 is only ever driven through this channel
            let driver = SpiDriver::new(
                unsafe { SPI2::new() },
                sclk,
                mosi,
                Option::<AnyIOPin>::None,
                &driver_config,
            )
            .map_err(|e| bus_error("spi bus init", e))?;

            let device_config =
                spi::config::Config::new().baudrate(config.effective_clock_hz().Hz());
            let spi = SpiDeviceDriver::new(driver, Some(cs), &device_config)
                .map_err(|e| bus_error("spi add device", e))?;

            log::info!(
                "SPI bus up on {:?} at {} Hz",
                config.host,
                config.effective_clock_hz()
            );
            Ok(SpiBus::new(spi, dc, rst, busy, FreeRtos))
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory platform used by the driver tests

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use display_interface::DisplayError;

    use super::Platform;
    use crate::epd::interface::{BusChannel, Level, OutputLine};
    use crate::epd::pins::{LineId, PanelConfig};

    /// Everything a [`FakeChannel`] saw, in order
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Command(u8),
        Data(Vec<u8>),
        Line(OutputLine, Level),
        BusyRead,
        Delay(u32),
    }

    #[derive(Default)]
    pub struct Log {
        pub events: Vec<Event>,
        pub acquired: usize,
        pub released: usize,
        pub busy_script: VecDeque<Level>,
    }

    impl Log {
        pub fn commands(&self) -> Vec<u8> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Command(op) => Some(*op),
                    _ => None,
                })
                .collect()
        }

        pub fn count(&self, opcode: u8) -> usize {
            self.commands().iter().filter(|&&c| c == opcode).count()
        }
    }

    pub struct FakeChannel {
        log: Rc<RefCell<Log>>,
        dc: Level,
    }

    impl BusChannel for FakeChannel {
        fn transmit(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
            let event = match self.dc {
                Level::Low => Event::Command(bytes[0]),
                Level::High => Event::Data(bytes.to_vec()),
            };
            self.log.borrow_mut().events.push(event);
            Ok(())
        }

        fn set_line(&mut self, line: OutputLine, level: Level) -> Result<(), DisplayError> {
            match line {
                OutputLine::DataCommand => self.dc = level,
                OutputLine::Reset => self.log.borrow_mut().events.push(Event::Line(line, level)),
            }
            Ok(())
        }

        fn read_busy(&mut self) -> Result<Level, DisplayError> {
            let mut log = self.log.borrow_mut();
            log.events.push(Event::BusyRead);
            Ok(log.busy_script.pop_front().unwrap_or(Level::Low))
        }

        fn delay_ms(&mut self, ms: u32) {
            self.log.borrow_mut().events.push(Event::Delay(ms));
        }
    }

    /// Platform with 48 valid lines whose channels all write into one shared log
    #[derive(Default, Clone)]
    pub struct FakePlatform {
        pub log: Rc<RefCell<Log>>,
    }

    impl Platform for FakePlatform {
        type Channel = FakeChannel;

        fn line_limit(&self) -> LineId {
            48
        }

        fn acquire(&mut self, _config: &PanelConfig) -> Result<FakeChannel, DisplayError> {
            self.log.borrow_mut().acquired += 1;
            Ok(FakeChannel {
                log: Rc::clone(&self.log),
                dc: Level::High,
            })
        }

        fn release(&mut self, channel: FakeChannel) {
            self.log.borrow_mut().released += 1;
            drop(channel);
        }
    }
}
