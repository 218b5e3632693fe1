//! Motion math shared between the behavior layer and the drive controller

mod encoder;
mod units;

pub use encoder::TickCapture;
pub use units::{rpm_from_ticks, ticks_for_distance, wheel_ticks_for_rotation};
