//! Drive base output seam

/// Per-wheel PWM duty output
///
/// Duty is a signed percentage; sign selects direction.
pub trait WheelOutputs {
    fn set_duty(&mut self, left_pct: i16, right_pct: i16);
}
