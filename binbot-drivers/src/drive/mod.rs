//! Drive base control
//!
//! The behavior layer commands moves in millimeters and degrees; this
//! module turns them into per-wheel PWM duty. Control runs as a cascade:
//! outer PD loops on distance and heading produce wheel speed targets,
//! inner PI loops on measured wheel speed produce duty. All math is Q16.16
//! fixed point, no hardware float required.

pub mod controller;
pub mod fixed;
pub mod hbridge;
pub mod pid;

pub use controller::{DriveCommand, DriveController};
pub use fixed::Fixed32;
pub use hbridge::{HBridgeWheel, PwmWheels};
pub use pid::{PdLoop, PiLoop};
