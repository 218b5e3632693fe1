//! Ball color vocabulary shared across the firmware
//!
//! The classifier in the drivers crate produces these; the referee link
//! maps its wire color codes onto them; the behavior layer routes balls
//! by them.

/// Classified ball color
///
/// `code()` is the `BallDetected` event parameter encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BallColor {
    Red,
    Green,
    Blue,
    Yellow,
    /// No calibration window matched
    Unknown,
}

impl BallColor {
    /// Event-parameter encoding
    pub const fn code(self) -> u16 {
        match self {
            BallColor::Red => 0,
            BallColor::Green => 1,
            BallColor::Blue => 2,
            BallColor::Yellow => 3,
            BallColor::Unknown => 0xFF,
        }
    }

    /// Decode an event parameter; anything unrecognized is `Unknown`
    pub const fn from_code(code: u16) -> Self {
        match code {
            0 => BallColor::Red,
            1 => BallColor::Green,
            2 => BallColor::Blue,
            3 => BallColor::Yellow,
            _ => BallColor::Unknown,
        }
    }
}

/// One full RGBC acquisition from the color sensor
///
/// Raw 16-bit channel words; the clear channel normalizes the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelReadings {
    pub clear: u16,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl ChannelReadings {
    /// Percentage of the clear channel a color channel accounts for
    ///
    /// Returns 0 when the clear channel is zero (dark / sensor off).
    pub fn percent_of_clear(&self, channel_value: u16) -> u8 {
        if self.clear == 0 {
            return 0;
        }
        ((channel_value as u32 * 100) / self.clear as u32).min(100) as u8
    }
}
