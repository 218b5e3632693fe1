//! TCS3472 register map and transaction step tables
//!
//! Each table is a constant list of bus operations ending in `End`. A
//! step may name a suspend mode; the sequencer parks there until the bus
//! busy flag clears or a settle timer fires, then moves on.

/// Register addresses (without the command bit)
pub mod reg {
    /// Command bit, set on every register-pointer write
    pub const CMD: u8 = 0x80;

    pub const ENABLE: u8 = 0x00;
    pub const ATIME: u8 = 0x01;
    pub const CONTROL: u8 = 0x0F;
    pub const CDATAL: u8 = 0x14;
    pub const CDATAH: u8 = 0x15;
    pub const RDATAL: u8 = 0x16;
    pub const RDATAH: u8 = 0x17;
    pub const GDATAL: u8 = 0x18;
    pub const GDATAH: u8 = 0x19;
    pub const BDATAL: u8 = 0x1A;
    pub const BDATAH: u8 = 0x1B;

    /// ENABLE register: power on
    pub const PON: u8 = 0x01;
    /// ENABLE register: RGBC ADC enable
    pub const AEN: u8 = 0x02;
    /// ATIME value for a 154ms integration window
    pub const ATIME_154MS: u8 = 0xC0;
    /// CONTROL register: 4x analog gain
    pub const GAIN_4X: u8 = 0x01;
}

/// Color channel a completed 16-bit read is committed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Clear,
    Red,
    Green,
    Blue,
}

/// One bus operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOp {
    /// Write a register pointer with the command bit set
    WriteCommand(u8),
    /// Write a data byte to the addressed register
    WriteByte(u8),
    /// Begin a one-byte read of the given register
    ReadByte(u8),
    /// Stash the last collected byte as the low half of a word
    StoreLow,
    /// Combine the last collected byte as the high half and commit the
    /// word to a channel
    StoreHigh(Channel),
    /// Sequence end marker
    End,
}

/// What the sequencer does after executing a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SuspendMode {
    /// Continue with the next step immediately
    None,
    /// Park until the bus busy flag clears
    Busy,
    /// Park for one settle-timer period
    Time,
}

/// One table entry
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Step {
    pub op: StepOp,
    pub suspend: SuspendMode,
}

const fn step(op: StepOp, suspend: SuspendMode) -> Step {
    Step { op, suspend }
}

/// Named step tables; the id travels as the `SequenceStart` param
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum SequenceId {
    PowerUp = 0,
    ReadRgbc = 1,
    ReadClear = 2,
}

impl SequenceId {
    pub const fn from_param(param: u16) -> Option<Self> {
        match param {
            0 => Some(SequenceId::PowerUp),
            1 => Some(SequenceId::ReadRgbc),
            2 => Some(SequenceId::ReadClear),
            _ => None,
        }
    }

    pub const fn steps(self) -> &'static [Step] {
        match self {
            SequenceId::PowerUp => &POWER_UP,
            SequenceId::ReadRgbc => &READ_RGBC,
            SequenceId::ReadClear => &READ_CLEAR,
        }
    }
}

/// Power-on bring-up
///
/// PON must settle before AEN is raised; the datasheet asks for 2.4ms,
/// covered by one settle-timer period.
pub const POWER_UP: [Step; 9] = [
    step(StepOp::WriteCommand(reg::CMD | reg::ENABLE), SuspendMode::Busy),
    step(StepOp::WriteByte(reg::PON), SuspendMode::Time),
    step(StepOp::WriteCommand(reg::CMD | reg::ENABLE), SuspendMode::Busy),
    step(StepOp::WriteByte(reg::PON | reg::AEN), SuspendMode::Busy),
    step(StepOp::WriteCommand(reg::CMD | reg::ATIME), SuspendMode::Busy),
    step(StepOp::WriteByte(reg::ATIME_154MS), SuspendMode::Busy),
    step(StepOp::WriteCommand(reg::CMD | reg::CONTROL), SuspendMode::Busy),
    step(StepOp::WriteByte(reg::GAIN_4X), SuspendMode::Busy),
    step(StepOp::End, SuspendMode::None),
];

/// Full four-channel acquisition, low byte before high per the datasheet
pub const READ_RGBC: [Step; 17] = [
    step(StepOp::ReadByte(reg::CMD | reg::CDATAL), SuspendMode::Busy),
    step(StepOp::StoreLow, SuspendMode::None),
    step(StepOp::ReadByte(reg::CMD | reg::CDATAH), SuspendMode::Busy),
    step(StepOp::StoreHigh(Channel::Clear), SuspendMode::None),
    step(StepOp::ReadByte(reg::CMD | reg::RDATAL), SuspendMode::Busy),
    step(StepOp::StoreLow, SuspendMode::None),
    step(StepOp::ReadByte(reg::CMD | reg::RDATAH), SuspendMode::Busy),
    step(StepOp::StoreHigh(Channel::Red), SuspendMode::None),
    step(StepOp::ReadByte(reg::CMD | reg::GDATAL), SuspendMode::Busy),
    step(StepOp::StoreLow, SuspendMode::None),
    step(StepOp::ReadByte(reg::CMD | reg::GDATAH), SuspendMode::Busy),
    step(StepOp::StoreHigh(Channel::Green), SuspendMode::None),
    step(StepOp::ReadByte(reg::CMD | reg::BDATAL), SuspendMode::Busy),
    step(StepOp::StoreLow, SuspendMode::None),
    step(StepOp::ReadByte(reg::CMD | reg::BDATAH), SuspendMode::Busy),
    step(StepOp::StoreHigh(Channel::Blue), SuspendMode::None),
    step(StepOp::End, SuspendMode::None),
];

/// Clear channel only, for ambient-light and presence checks
pub const READ_CLEAR: [Step; 5] = [
    step(StepOp::ReadByte(reg::CMD | reg::CDATAL), SuspendMode::Busy),
    step(StepOp::StoreLow, SuspendMode::None),
    step(StepOp::ReadByte(reg::CMD | reg::CDATAH), SuspendMode::Busy),
    step(StepOp::StoreHigh(Channel::Clear), SuspendMode::None),
    step(StepOp::End, SuspendMode::None),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_end_marked() {
        for id in [SequenceId::PowerUp, SequenceId::ReadRgbc, SequenceId::ReadClear] {
            let steps = id.steps();
            assert!(matches!(steps[steps.len() - 1].op, StepOp::End));
        }
    }

    #[test]
    fn test_id_roundtrip() {
        assert_eq!(SequenceId::from_param(0), Some(SequenceId::PowerUp));
        assert_eq!(SequenceId::from_param(1), Some(SequenceId::ReadRgbc));
        assert_eq!(SequenceId::from_param(2), Some(SequenceId::ReadClear));
        assert_eq!(SequenceId::from_param(9), None);
    }

    #[test]
    fn test_reads_pair_low_then_high() {
        let mut pending_low = false;
        for s in READ_RGBC.iter() {
            match s.op {
                StepOp::StoreLow => pending_low = true,
                StepOp::StoreHigh(_) => {
                    assert!(pending_low);
                    pending_low = false;
                }
                _ => {}
            }
        }
        assert!(!pending_low);
    }
}
