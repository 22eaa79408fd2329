//! Controller opcodes and the command payload builders used by the protocol

use heapless::Vec;

use crate::epd::flag::Flag;
use crate::epd::Geometry;

/// Longest literal payload of any single register write (booster soft start)
pub const MAX_PAYLOAD: usize = 5;

pub struct Cmd;
#[allow(missing_docs)]
impl Cmd {
    // Init
    pub const SW_RESET: u8 = 0x12;
    pub const DRIVER_CONTROL: u8 = 0x01;
    pub const DATA_ENTRY_MODE: u8 = 0x11;
    pub const TEMP_CONTROL: u8 = 0x18;
    pub const WRITE_TEMP_REGISTER: u8 = 0x1A;
    pub const BOOST_SOFT_START_CONTROL: u8 = 0x0C;
    pub const BORDER_WAVEFORM_CONTROL: u8 = 0x3C;
    pub const SET_RAMX_START_END: u8 = 0x44;
    pub const SET_RAMY_START_END: u8 = 0x45;
    pub const DEEP_SLEEP_MODE: u8 = 0x10;

    // Waveform
    pub const WRITE_LUT_REGISTER: u8 = 0x32;
    pub const GATE_VOLTAGE_CONTROL: u8 = 0x03;
    pub const SOURCE_VOLTAGE_CONTROL: u8 = 0x04;
    pub const WRITE_VCOM_REGISTER: u8 = 0x2C;

    // Update
    pub const SET_RAMX_COUNTER: u8 = 0x4E;
    pub const SET_RAMY_COUNTER: u8 = 0x4F;
    pub const WRITE_BW_DATA: u8 = 0x24;
    pub const WRITE_OLD_DATA: u8 = 0x26;
    pub const UPDATE_DISPLAY_CTRL2: u8 = 0x22;
    pub const MASTER_ACTIVATE: u8 = 0x20;
}

/// One register write: an opcode and its literal payload.
///
/// Payloads are tiny and known up front, so they live inline; bulk RAM and LUT
/// data is streamed separately by the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    opcode: u8,
    payload: Vec<u8, MAX_PAYLOAD>,
}

impl Command {
    /// Opcode without payload
    pub const fn bare(opcode: u8) -> Self {
        Self {
            opcode,
            payload: Vec::new(),
        }
    }

    /// Opcode with a literal payload; `N` above [`MAX_PAYLOAD`] fails to compile
    fn with<const N: usize>(opcode: u8, payload: [u8; N]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Fits::<N>::OK;
        Self {
            opcode,
            payload: Vec::from_slice(&payload).unwrap_or_default(),
        }
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn soft_reset() -> Self {
        Self::bare(Cmd::SW_RESET)
    }

    pub fn temperature_sensor(source: u8) -> Self {
        Self::with(Cmd::TEMP_CONTROL, [source])
    }

    pub fn temperature_register(value: u8) -> Self {
        Self::with(Cmd::WRITE_TEMP_REGISTER, [value])
    }

    pub fn booster_soft_start() -> Self {
        Self::with(Cmd::BOOST_SOFT_START_CONTROL, Flag::BOOSTER_SOFT_START)
    }

    /// Gate count is programmed from the panel width, as the controller scans it
    pub fn driver_output(geometry: Geometry) -> Self {
        let [lo, hi] = le(geometry.width - 1);
        Self::with(
            Cmd::DRIVER_CONTROL,
            [lo, hi, Flag::DRIVER_OUTPUT_INTERLACED],
        )
    }

    pub fn border_waveform(value: u8) -> Self {
        Self::with(Cmd::BORDER_WAVEFORM_CONTROL, [value])
    }

    pub fn data_entry_mode(mode: u8) -> Self {
        Self::with(Cmd::DATA_ENTRY_MODE, [mode])
    }

    /// RAM X extent, both bounds as 16-bit little endian
    pub fn ram_x_window(start: u16, end: u16) -> Self {
        Self::range(Cmd::SET_RAMX_START_END, start, end)
    }

    /// RAM Y extent, both bounds as 16-bit little endian
    pub fn ram_y_window(start: u16, end: u16) -> Self {
        Self::range(Cmd::SET_RAMY_START_END, start, end)
    }

    pub fn ram_x_counter(x: u16) -> Self {
        Self::with(Cmd::SET_RAMX_COUNTER, le(x))
    }

    pub fn ram_y_counter(y: u16) -> Self {
        Self::with(Cmd::SET_RAMY_COUNTER, le(y))
    }

    pub fn update_control(sequence: u8) -> Self {
        Self::with(Cmd::UPDATE_DISPLAY_CTRL2, [sequence])
    }

    pub fn master_activate() -> Self {
        Self::bare(Cmd::MASTER_ACTIVATE)
    }

    pub fn deep_sleep() -> Self {
        Self::with(Cmd::DEEP_SLEEP_MODE, [Flag::DEEP_SLEEP_MODE_1])
    }

    fn range(opcode: u8, start: u16, end: u16) -> Self {
        let [s_lo, s_hi] = le(start);
        let [e_lo, e_hi] = le(end);
        Self::with(opcode, [s_lo, s_hi, e_lo, e_hi])
    }
}

struct Fits<const N: usize>;

impl<const N: usize> Fits<N> {
    const OK: () = assert!(N <= MAX_PAYLOAD, "payload exceeds MAX_PAYLOAD");
}

fn le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}
