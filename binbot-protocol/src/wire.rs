//! Byte-level encoding of the referee link
//!
//! Commands go out as `[cmd, 0x00, 0x00]`. Replies are three bytes with
//! the payload in the last position. Two payload bytes carry packed
//! fields: the status byte (match phase plus the two station colors) and
//! the team byte (assigned color plus a beacon period table index).

use binbot_core::color::BallColor;

/// Frame length in both directions
pub const FRAME_LEN: usize = 3;

/// Index of the payload byte within a reply frame
pub const REPLY_PAYLOAD_INDEX: usize = 2;

/// IR beacon periods in microseconds, indexed by the team byte's
/// frequency field
pub const BEACON_PERIOD_US: [u16; 16] = [
    526, 588, 667, 741, 769, 833, 909, 1000, 1111, 1250, 1429, 1667, 2000, 2500, 3333, 5000,
];

/// Commands the master may transmit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Announce our team number (low nibble of the command byte)
    Register(u8),
    QueryTeam,
    QueryStatus,
    QueryValue,
}

impl Command {
    pub const fn byte(self) -> u8 {
        match self {
            Command::Register(team) => 0x80 | (team & 0x0F),
            Command::QueryTeam => 0x01,
            Command::QueryStatus => 0x02,
            Command::QueryValue => 0x03,
        }
    }

    /// Full outgoing frame: command byte plus two pad bytes
    pub const fn encode(self) -> [u8; FRAME_LEN] {
        [self.byte(), 0x00, 0x00]
    }
}

/// The acknowledgement byte the device returns for a successful
/// registration of the given team
pub const fn expected_ack(team: u8) -> u8 {
    0xA0 | (team & 0x0F)
}

/// Match phase, from the status byte's low two bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MatchPhase {
    WaitingForStart,
    Active,
    Over,
}

impl MatchPhase {
    /// The reserved 0b11 encoding never occurs in a well-behaved device;
    /// treating it as Over fails toward the safe side (robot parks).
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => MatchPhase::WaitingForStart,
            0b01 => MatchPhase::Active,
            _ => MatchPhase::Over,
        }
    }
}

fn color_from_bits(bits: u8) -> BallColor {
    BallColor::from_code((bits & 0x07) as u16)
}

/// Status reply payload
///
/// Bits 0-1: match phase. Bits 2-4 and 5-7: the colors currently
/// accepted at station 0 and station 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusByte(pub u8);

impl StatusByte {
    pub fn phase(self) -> MatchPhase {
        MatchPhase::from_bits(self.0)
    }

    pub fn station0_color(self) -> BallColor {
        color_from_bits(self.0 >> 2)
    }

    pub fn station1_color(self) -> BallColor {
        color_from_bits(self.0 >> 5)
    }

    /// Which station currently accepts the given color
    pub fn station_for(self, color: BallColor) -> Option<u8> {
        if self.station0_color() == color {
            Some(0)
        } else if self.station1_color() == color {
            Some(1)
        } else {
            None
        }
    }
}

/// Team reply payload
///
/// Bits 1-3: assigned recycling color. Bits 4-7: index into
/// [`BEACON_PERIOD_US`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TeamInfo(pub u8);

impl TeamInfo {
    pub fn assigned_color(self) -> BallColor {
        color_from_bits(self.0 >> 1)
    }

    pub fn beacon_period_us(self) -> u16 {
        BEACON_PERIOD_US[((self.0 >> 4) & 0x0F) as usize]
    }
}
