//! FT6336 capacitive touch controller
//!
//! Polled over I2C: [`Ft6336::touch_ready`] watches the interrupt line and
//! [`Ft6336::scan`] reads up to two points when it is asserted.

use display_interface::DisplayError;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    i2c::{Error as _, I2c},
};

use crate::epd::{Error, Result};

pub mod types;
pub use types::*;

/// 7-bit bus address
pub const I2C_ADDRESS: u8 = 0x38;

const REG_DEVICE_MODE: u8 = 0x00;
const REG_TD_STATUS: u8 = 0x02;
const REG_TOUCH_THRESHOLD: u8 = 0x80;
const REG_ACTIVE_PERIOD: u8 = 0x88;
/// First register of each point record
const REG_POINTS: [u8; MAX_POINTS] = [0x03, 0x09];

const DEVICE_MODE_WORKING: u8 = 0x00;
const TOUCH_THRESHOLD: u8 = 22;
const ACTIVE_PERIOD: u8 = 14;

const RESET_LOW_MS: u32 = 50;
const RESET_SETTLE_MS: u32 = 120;

/// FT6336 driver
///
/// ## Type Parameters
///
/// - `I2C` - bus the controller sits on
/// - `RST` - reset output, active low
/// - `INT` - interrupt input, low while touched
/// - `DELAY` - delay provider for the reset pulse
pub struct Ft6336<I2C, RST, INT, DELAY> {
    i2c: I2C,
    rst: RST,
    int: INT,
    delay: DELAY,
    initialised: bool,
}

impl<I2C, RST, INT, DELAY> Ft6336<I2C, RST, INT, DELAY>
where
    I2C: I2c,
    RST: OutputPin,
    INT: InputPin,
    DELAY: DelayNs,
{
    pub fn new(i2c: I2C, rst: RST, int: INT, delay: DELAY) -> Self {
        Self {
            i2c,
            rst,
            int,
            delay,
            initialised: false,
        }
    }

    /// Reset the controller and program its working mode
    pub fn init(&mut self) -> Result<()> {
        if self.initialised {
            return Err(Error::InvalidState("touch controller already initialised"));
        }

        self.reset()?;
        self.write_register(REG_DEVICE_MODE, DEVICE_MODE_WORKING)?;
        self.write_register(REG_TOUCH_THRESHOLD, TOUCH_THRESHOLD)?;
        self.write_register(REG_ACTIVE_PERIOD, ACTIVE_PERIOD)?;

        self.initialised = true;
        log::info!("Touch controller initialised");
        Ok(())
    }

    /// True while the interrupt line signals a touch; false before `init`
    pub fn touch_ready(&mut self) -> bool {
        self.initialised && self.int.is_low().unwrap_or(false)
    }

    /// Read the current contacts
    pub fn scan(&mut self) -> Result<TouchData> {
        if !self.initialised {
            return Err(Error::InvalidState("touch controller not initialised"));
        }

        let mut status = [0u8; 1];
        self.read_registers(REG_TD_STATUS, &mut status)?;
        let reported = usize::from(status[0] & 0x0F).min(MAX_POINTS);

        let mut touch = TouchData::default();
        for &reg in &REG_POINTS[..reported] {
            let mut buf = [0u8; 4];
            self.read_registers(reg, &mut buf)?;
            if let Some(point) = TouchPoint::from_registers(buf) {
                // capacity equals REG_POINTS.len(), push cannot fail
                let _ = touch.points.push(point);
            }
        }
        Ok(touch)
    }

    /// Give the peripherals back
    pub fn release(self) -> (I2C, RST, INT, DELAY) {
        (self.i2c, self.rst, self.int, self.delay)
    }

    fn reset(&mut self) -> Result<()> {
        self.rst.set_low().map_err(|_| DisplayError::RSError)?;
        self.delay.delay_ms(RESET_LOW_MS);
        self.rst.set_high().map_err(|_| DisplayError::RSError)?;
        self.delay.delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        self.i2c.write(I2C_ADDRESS, &[reg, value]).map_err(|e| {
            log::error!("Touch register 0x{:02X} write failed: {:?}", reg, e);
            Error::I2c(e.kind())
        })
    }

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        self.i2c.write_read(I2C_ADDRESS, &[reg], buf).map_err(|e| {
            log::error!("Touch register 0x{:02X} read failed: {:?}", reg, e);
            Error::I2c(e.kind())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    fn init_transactions() -> Vec<I2cTransaction> {
        vec![
            I2cTransaction::write(I2C_ADDRESS, vec![0x00, 0x00]),
            I2cTransaction::write(I2C_ADDRESS, vec![0x80, 22]),
            I2cTransaction::write(I2C_ADDRESS, vec![0x88, 14]),
        ]
    }

    fn reset_transactions() -> [PinTransaction; 2] {
        [
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]
    }

    #[test]
    fn init_resets_and_programs_registers() {
        let mut i2c = I2cMock::new(&init_transactions());
        let mut rst = PinMock::new(&reset_transactions());
        let mut int = PinMock::new(&[PinTransaction::get(PinState::Low)]);

        let mut touch = Ft6336::new(i2c.clone(), rst.clone(), int.clone(), NoopDelay);
        assert!(!touch.touch_ready());
        touch.init().unwrap();
        assert!(touch.touch_ready());
        assert!(matches!(touch.init(), Err(Error::InvalidState(_))));

        i2c.done();
        rst.done();
        int.done();
    }

    #[test]
    fn scan_before_init_is_invalid_state() {
        let mut i2c = I2cMock::new(&[]);
        let mut rst = PinMock::new(&[]);
        let mut int = PinMock::new(&[]);

        let mut touch = Ft6336::new(i2c.clone(), rst.clone(), int.clone(), NoopDelay);
        assert!(matches!(touch.scan(), Err(Error::InvalidState(_))));

        i2c.done();
        rst.done();
        int.done();
    }

    #[test]
    fn scan_decodes_contacts_and_skips_lifted_points() {
        let mut expectations = init_transactions();
        expectations.extend([
            // status reports 3, capped at 2
            I2cTransaction::write_read(I2C_ADDRESS, vec![0x02], vec![0x03]),
            I2cTransaction::write_read(I2C_ADDRESS, vec![0x03], vec![0x81, 0x2C, 0x11, 0x90]),
            // event bits 01: lift up, not a contact
            I2cTransaction::write_read(I2C_ADDRESS, vec![0x09], vec![0x40, 0x10, 0x20, 0x30]),
        ]);
        let mut i2c = I2cMock::new(&expectations);
        let mut rst = PinMock::new(&reset_transactions());
        let mut int = PinMock::new(&[]);

        let mut touch = Ft6336::new(i2c.clone(), rst.clone(), int.clone(), NoopDelay);
        touch.init().unwrap();
        let data = touch.scan().unwrap();

        assert_eq!(data.count(), 1);
        assert_eq!(
            data.points[0],
            TouchPoint {
                x: 0x12C,
                y: 0x190,
                id: 1,
                event: TouchEvent::Contact,
            }
        );
        assert_eq!(data.to_string(), "#1 contact at (300, 400)");

        i2c.done();
        rst.done();
        int.done();
    }

    #[test]
    fn scan_with_no_touches_reads_status_only() {
        let mut expectations = init_transactions();
        expectations.push(I2cTransaction::write_read(I2C_ADDRESS, vec![0x02], vec![0x00]));
        let mut i2c = I2cMock::new(&expectations);
        let mut rst = PinMock::new(&reset_transactions());
        let mut int = PinMock::new(&[]);

        let mut touch = Ft6336::new(i2c.clone(), rst.clone(), int.clone(), NoopDelay);
        touch.init().unwrap();
        let data = touch.scan().unwrap();
        assert!(data.is_empty());
        assert_eq!(data.to_string(), "no touch");

        i2c.done();
        rst.done();
        int.done();
    }

    #[test]
    fn bus_failure_maps_to_i2c_error() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(I2C_ADDRESS, vec![0x00, 0x00]).with_error(ErrorKind::Other)
        ]);
        let mut rst = PinMock::new(&reset_transactions());
        let mut int = PinMock::new(&[]);

        let mut touch = Ft6336::new(i2c.clone(), rst.clone(), int.clone(), NoopDelay);
        assert!(matches!(touch.init(), Err(Error::I2c(ErrorKind::Other))));
        assert!(matches!(touch.scan(), Err(Error::InvalidState(_))));

        i2c.done();
        rst.done();
        int.done();
    }
}
