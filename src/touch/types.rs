//! Types for touch handling

/// Maximum simultaneous contacts the controller reports
pub const MAX_POINTS: usize = 2;

/// Event flag reported with each touch point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    PressDown,
    LiftUp,
    Contact,
    NoEvent,
}

impl From<u8> for TouchEvent {
    /// Decode the two event bits
    fn from(bits: u8) -> Self {
        match bits & 0x03 {
            0 => TouchEvent::PressDown,
            1 => TouchEvent::LiftUp,
            2 => TouchEvent::Contact,
            _ => TouchEvent::NoEvent,
        }
    }
}

/// One reported touch point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
    /// Touch id assigned by the controller, stable while the finger stays down
    pub id: u8,
    pub event: TouchEvent,
}

impl TouchPoint {
    /// Decode a 4-byte point record; `None` unless it is a live contact
    pub fn from_registers(buf: [u8; 4]) -> Option<Self> {
        if buf[0] & 0xC0 != 0x80 {
            return None;
        }
        Some(Self {
            x: u16::from(buf[0] & 0x0F) << 8 | u16::from(buf[1]),
            y: u16::from(buf[2] & 0x0F) << 8 | u16::from(buf[3]),
            id: buf[2] >> 4,
            event: TouchEvent::from(buf[0] >> 6),
        })
    }
}

/// Touch points from one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchData {
    pub points: heapless::Vec<TouchPoint, MAX_POINTS>,
}

impl TouchData {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn count(&self) -> usize {
        self.points.len()
    }
}

impl std::fmt::Display for TouchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TouchEvent::PressDown => write!(f, "press down"),
            TouchEvent::LiftUp => write!(f, "lift up"),
            TouchEvent::Contact => write!(f, "contact"),
            TouchEvent::NoEvent => write!(f, "no event"),
        }
    }
}

impl std::fmt::Display for TouchPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} at ({}, {})", self.id, self.event, self.x, self.y)
    }
}

impl std::fmt::Display for TouchData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.points.is_empty() {
            return write!(f, "no touch");
        }
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", point)?;
        }
        Ok(())
    }
}
