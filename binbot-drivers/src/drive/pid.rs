//! Control loop primitives
//!
//! Two small loop shapes cover the drive cascade: a PD loop for the
//! position terms (distance, heading) and a PI loop with anti-windup for
//! the wheel speed terms. Both are pure step functions over fixed-point
//! state; the controller owns pairing them with measurements.

use super::fixed::Fixed32;

/// Proportional-derivative loop
///
/// Derivative is taken on the error; at the position level the setpoint
/// only changes when a new move is commanded, and `reset` clears the
/// history at that moment.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PdLoop {
    kp: Fixed32,
    kd: Fixed32,
    prev_error: Fixed32,
    primed: bool,
}

impl PdLoop {
    pub const fn new(kp: Fixed32, kd: Fixed32) -> Self {
        Self {
            kp,
            kd,
            prev_error: Fixed32::ZERO,
            primed: false,
        }
    }

    /// One control period; returns the unclamped output
    pub fn step(&mut self, error: Fixed32) -> Fixed32 {
        // First step after a reset has no derivative history
        let d_error = if self.primed {
            error - self.prev_error
        } else {
            Fixed32::ZERO
        };
        self.prev_error = error;
        self.primed = true;

        self.kp.mul(error).saturating_add(self.kd.mul(d_error))
    }

    pub fn reset(&mut self) {
        self.prev_error = Fixed32::ZERO;
        self.primed = false;
    }
}

/// Proportional-integral loop with integrator clamping
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PiLoop {
    kp: Fixed32,
    ki: Fixed32,
    integral: Fixed32,
    integral_limit: Fixed32,
}

impl PiLoop {
    pub const fn new(kp: Fixed32, ki: Fixed32, integral_limit: Fixed32) -> Self {
        Self {
            kp,
            ki,
            integral: Fixed32::ZERO,
            integral_limit,
        }
    }

    /// One control period; returns the unclamped output
    pub fn step(&mut self, error: Fixed32) -> Fixed32 {
        self.integral = self
            .integral
            .saturating_add(self.ki.mul(error))
            .clamp(-self.integral_limit, self.integral_limit);

        self.kp.mul(error).saturating_add(self.integral)
    }

    pub fn reset(&mut self) {
        self.integral = Fixed32::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pd_proportional_only_first_step() {
        let mut pd = PdLoop::new(Fixed32::from_scaled_1000(500), Fixed32::from_int(10));
        // No derivative kick on the first step after reset
        let out = pd.step(Fixed32::from_int(10));
        assert_eq!(out.to_int(), 5);
    }

    #[test]
    fn test_pd_derivative_opposes_fast_approach() {
        let mut pd = PdLoop::new(Fixed32::from_scaled_1000(1000), Fixed32::from_scaled_1000(1000));
        pd.step(Fixed32::from_int(10));
        // Error dropped by 6 in one period: output = 4 + (-6) = -2
        let out = pd.step(Fixed32::from_int(4));
        assert_eq!(out.to_int(), -2);
    }

    #[test]
    fn test_pd_reset_clears_history() {
        let mut pd = PdLoop::new(Fixed32::ZERO, Fixed32::from_int(1));
        pd.step(Fixed32::from_int(10));
        pd.reset();
        assert_eq!(pd.step(Fixed32::from_int(3)), Fixed32::ZERO);
    }

    #[test]
    fn test_pi_integral_accumulates() {
        let mut pi = PiLoop::new(
            Fixed32::ZERO,
            Fixed32::from_scaled_1000(100),
            Fixed32::from_int(50),
        );
        let mut out = Fixed32::ZERO;
        for _ in 0..5 {
            out = pi.step(Fixed32::from_int(10));
        }
        // 5 periods * 0.1 * 10 = 5
        assert_eq!(out.to_int(), 5);
    }

    #[test]
    fn test_pi_windup_clamped() {
        let mut pi = PiLoop::new(
            Fixed32::ZERO,
            Fixed32::from_int(1),
            Fixed32::from_int(20),
        );
        for _ in 0..100 {
            pi.step(Fixed32::from_int(10));
        }
        assert_eq!(pi.step(Fixed32::ZERO).to_int(), 20);

        pi.reset();
        assert_eq!(pi.step(Fixed32::ZERO), Fixed32::ZERO);
    }
}
