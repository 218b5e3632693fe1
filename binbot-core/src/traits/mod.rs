//! Hardware abstraction seams
//!
//! Small traits the drivers crate implements against real peripherals and
//! tests implement with mocks.

mod bus;
mod drive;

pub use bus::{BusError, BusPort, BusStatus};
pub use drive::WheelOutputs;
