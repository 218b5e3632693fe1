//! Byte-oriented bus seam for the color sensor
//!
//! Models the addressed 8-bit device the sequencer drives: command-byte
//! writes, register-pointer reads, and a busy/error status flag polled
//! once per scheduler pass.

/// Bus transaction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Device did not acknowledge
    Nack,
    /// Hardware error flag set mid-transaction
    Fault,
}

/// Snapshot of the bus hardware flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusStatus {
    /// A transaction is still in flight
    pub busy: bool,
    /// The hardware error flag is set
    pub error: bool,
}

/// One addressed bus device
pub trait BusPort {
    /// Write a command byte (register pointer with the command bit set)
    fn write_command(&mut self, value: u8) -> Result<(), BusError>;

    /// Write a plain data byte to the currently addressed register
    fn write_byte(&mut self, value: u8) -> Result<(), BusError>;

    /// Begin a one-byte read of the given register
    fn start_read(&mut self, reg: u8) -> Result<(), BusError>;

    /// Poll the hardware flags; called once per scheduler pass
    fn status(&mut self) -> BusStatus;

    /// Collect the byte produced by the last completed read
    fn take_byte(&mut self) -> u8;
}
