/// Register payload values used by the panel protocol.
///
/// Values come from the panel vendor's reference sequence; see the controller
/// datasheet for the meaning of individual bits.
pub struct Flag;
#[allow(missing_docs)]
impl Flag {
    // Driver Output Control (0x01) third byte: GD=0, SM=1 (interlaced), TB=0
    pub const DRIVER_OUTPUT_INTERLACED: u8 = 0x02;

    // Data Entry Mode (0x11) flags
    pub const DATA_ENTRY_INCRY_INCRX: u8 = 0x03; // Y increment, X increment

    // Deep Sleep Mode (0x10) flags
    pub const DEEP_SLEEP_MODE_1: u8 = 0x01; // Enter deep sleep mode, RAM retained

    // Temperature Sensor Control (0x18) flags
    pub const INTERNAL_TEMP_SENSOR: u8 = 0x80;

    // Write Temperature Register (0x1A), the value loaded before the clean start
    pub const TEMP_REGISTER_CLEAN_START: u8 = 0x5A;

    // Booster Soft Start Control (0x0C): phase 1..3, duration, then the fixed byte
    pub const BOOSTER_SOFT_START: [u8; 5] = [0xAE, 0xC7, 0xC3, 0xC0, 0x80];

    // Border Waveform Control (0x3C) flags
    pub const BORDER_WAVEFORM_LUT1: u8 = 0x01; // follow LUT1 during full refresh
    pub const BORDER_WAVEFORM_VCOM: u8 = 0x80; // hold border at VCOM during partial refresh

    // Display Update Control 2 (0x22) sequences
    pub const DISPLAY_UPDATE_CLEAN_START: u8 = 0x91; // clock, analog, load temp and LUT
    pub const DISPLAY_UPDATE_FULL: u8 = 0xC7; // enable analog, display, disable
    pub const DISPLAY_UPDATE_PARTIAL: u8 = 0xFF; // full sequence in display mode 2

    // Auto fill patterns
    pub const FILL_WHITE: u8 = 0xFF;
    pub const FILL_BLACK: u8 = 0x00;
}
