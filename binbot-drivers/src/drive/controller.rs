//! Closed-loop drive controller
//!
//! Tracks one commanded move at a time. The outer PD pair runs on tick
//! position error (common mode = distance, differential = heading), its
//! output is a wheel speed target in RPM clamped by the commanded speed;
//! the inner PI pair tracks measured wheel RPM and produces signed duty.
//! Encoder positions are sampled by the caller (the drive task reads the
//! ISR-owned tick captures) and handed in once per control period.

use binbot_core::config::DriveTuning;
use binbot_core::motion::{rpm_from_ticks, ticks_for_distance, wheel_ticks_for_rotation};
use binbot_core::traits::WheelOutputs;

use super::fixed::Fixed32;
use super::pid::{PdLoop, PiLoop};

/// Top wheel speed at 100 percent commanded speed
const MAX_WHEEL_RPM: i32 = 160;

/// One commanded move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveCommand {
    /// Straight line, signed millimeters
    Straight { speed: u8, distance_mm: i16 },
    /// Rotate in place, signed degrees (positive = clockwise)
    Rotate { speed: u8, angle_deg: i16 },
    Stop,
}

pub struct DriveController<W> {
    outputs: W,
    tuning: DriveTuning,
    distance_pd: PdLoop,
    heading_pd: PdLoop,
    left_pi: PiLoop,
    right_pi: PiLoop,
    /// Per-wheel tick targets; positions restart at zero with each command
    target_left: i32,
    target_right: i32,
    speed_limit_rpm: i32,
    prev_left: i32,
    prev_right: i32,
    active: bool,
}

impl<W: WheelOutputs> DriveController<W> {
    pub fn new(outputs: W, tuning: DriveTuning) -> Self {
        let distance_pd = PdLoop::new(
            Fixed32::from_scaled_1000(tuning.distance_kp_x1000),
            Fixed32::from_scaled_1000(tuning.distance_kd_x1000),
        );
        let heading_pd = PdLoop::new(
            Fixed32::from_scaled_1000(tuning.heading_kp_x1000),
            Fixed32::from_scaled_1000(tuning.heading_kd_x1000),
        );
        let speed_pi = PiLoop::new(
            Fixed32::from_scaled_1000(tuning.speed_kp_x1000),
            Fixed32::from_scaled_1000(tuning.speed_ki_x1000),
            Fixed32::from_int(tuning.integral_limit),
        );
        Self {
            outputs,
            tuning,
            distance_pd,
            heading_pd,
            left_pi: speed_pi,
            right_pi: speed_pi,
            target_left: 0,
            target_right: 0,
            speed_limit_rpm: 0,
            prev_left: 0,
            prev_right: 0,
            active: false,
        }
    }

    /// Begin a new move. The caller must zero the tick captures first;
    /// position accounting restarts from zero.
    pub fn command(&mut self, cmd: DriveCommand) {
        self.reset_loops();
        self.prev_left = 0;
        self.prev_right = 0;

        match cmd {
            DriveCommand::Straight { speed, distance_mm } => {
                let ticks = ticks_for_distance(
                    distance_mm,
                    self.tuning.wheel_circumference_mm,
                    self.tuning.ticks_per_rev,
                );
                self.target_left = ticks;
                self.target_right = ticks;
                self.speed_limit_rpm = speed_limit(speed);
                self.active = true;
            }
            DriveCommand::Rotate { speed, angle_deg } => {
                let ticks = wheel_ticks_for_rotation(
                    angle_deg,
                    self.tuning.track_width_mm,
                    self.tuning.wheel_circumference_mm,
                    self.tuning.ticks_per_rev,
                );
                // Clockwise: left wheel forward, right wheel backward
                self.target_left = ticks;
                self.target_right = -ticks;
                self.speed_limit_rpm = speed_limit(speed);
                self.active = true;
            }
            DriveCommand::Stop => {
                self.active = false;
                self.outputs.set_duty(0, 0);
            }
        }
    }

    /// True while a move is being tracked
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Access the wheel outputs
    pub fn outputs(&self) -> &W {
        &self.outputs
    }

    /// One control period. Returns true exactly once, when the commanded
    /// move settles within the position tolerance.
    pub fn update(&mut self, left_pos: i32, right_pos: i32) -> bool {
        if !self.active {
            return false;
        }

        let left_err = self.target_left - left_pos;
        let right_err = self.target_right - right_pos;
        let tol = self.tuning.position_tolerance_ticks;
        if left_err.abs() <= tol && right_err.abs() <= tol {
            self.active = false;
            self.outputs.set_duty(0, 0);
            return true;
        }

        // Outer loops: position error -> wheel speed target (RPM)
        let common = self.distance_pd.step(to_fixed(left_err + right_err).div_int(2));
        let diff = self.heading_pd.step(to_fixed(left_err - right_err).div_int(2));
        let limit = Fixed32::from_int(self.speed_limit_rpm as i16);
        let left_target = (common + diff).clamp(-limit, limit);
        let right_target = (common - diff).clamp(-limit, limit);

        // Inner loops: speed error -> duty
        let dt = self.tuning.loop_period_ms;
        let tpr = self.tuning.ticks_per_rev;
        let left_rpm = rpm_from_ticks(left_pos - self.prev_left, dt, tpr);
        let right_rpm = rpm_from_ticks(right_pos - self.prev_right, dt, tpr);
        self.prev_left = left_pos;
        self.prev_right = right_pos;

        let duty_lim = Fixed32::from_int(self.tuning.duty_limit);
        let left_duty = self
            .left_pi
            .step(left_target - Fixed32::from_int(left_rpm))
            .clamp(-duty_lim, duty_lim);
        let right_duty = self
            .right_pi
            .step(right_target - Fixed32::from_int(right_rpm))
            .clamp(-duty_lim, duty_lim);

        self.outputs.set_duty(left_duty.to_int(), right_duty.to_int());
        false
    }

    fn reset_loops(&mut self) {
        self.distance_pd.reset();
        self.heading_pd.reset();
        self.left_pi.reset();
        self.right_pi.reset();
    }
}

fn speed_limit(percent: u8) -> i32 {
    (MAX_WHEEL_RPM * percent.min(100) as i32) / 100
}

fn to_fixed(ticks: i32) -> Fixed32 {
    Fixed32::from_int(ticks.clamp(i16::MIN as i32, i16::MAX as i32) as i16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockWheels {
        left: i16,
        right: i16,
    }

    impl WheelOutputs for MockWheels {
        fn set_duty(&mut self, left_pct: i16, right_pct: i16) {
            self.left = left_pct;
            self.right = right_pct;
        }
    }

    fn controller() -> DriveController<MockWheels> {
        DriveController::new(MockWheels::default(), DriveTuning::default())
    }

    #[test]
    fn test_straight_drives_forward() {
        let mut ctl = controller();
        ctl.command(DriveCommand::Straight {
            speed: 60,
            distance_mm: 500,
        });
        assert!(ctl.is_active());

        let done = ctl.update(0, 0);
        assert!(!done);
        assert!(ctl.outputs().left > 0);
        assert!(ctl.outputs().right > 0);
    }

    #[test]
    fn test_rotate_drives_wheels_opposed() {
        let mut ctl = controller();
        ctl.command(DriveCommand::Rotate {
            speed: 40,
            angle_deg: 90,
        });

        ctl.update(0, 0);
        assert!(ctl.outputs().left > 0);
        assert!(ctl.outputs().right < 0);
    }

    #[test]
    fn test_completion_within_tolerance() {
        let mut ctl = controller();
        ctl.command(DriveCommand::Straight {
            speed: 60,
            distance_mm: 220, // exactly one wheel rev = 512 ticks
        });

        assert!(!ctl.update(100, 100));
        // Settled inside the 12-tick tolerance band
        assert!(ctl.update(505, 508));
        assert!(!ctl.is_active());
        assert_eq!(ctl.outputs().left, 0);
        assert_eq!(ctl.outputs().right, 0);

        // Completion reports exactly once
        assert!(!ctl.update(505, 508));
    }

    #[test]
    fn test_duty_clamped() {
        let mut ctl = controller();
        ctl.command(DriveCommand::Straight {
            speed: 100,
            distance_mm: 2000,
        });

        for _ in 0..50 {
            ctl.update(0, 0); // stalled wheels, integrator loads up
        }
        assert!(ctl.outputs().left <= 100);
        assert!(ctl.outputs().left > 0);
    }

    #[test]
    fn test_stop_cancels_move() {
        let mut ctl = controller();
        ctl.command(DriveCommand::Straight {
            speed: 60,
            distance_mm: 500,
        });
        ctl.update(0, 0);

        ctl.command(DriveCommand::Stop);
        assert!(!ctl.is_active());
        assert_eq!(ctl.outputs().left, 0);
        assert!(!ctl.update(10, 10));
    }

    #[test]
    fn test_settles_against_simulated_plant() {
        let mut ctl = controller();
        let t = DriveTuning::default();
        ctl.command(DriveCommand::Straight {
            speed: 60,
            distance_mm: 500,
        });

        // First-order plant: wheel speed chases the duty command with
        // inertia, position integrates speed over the loop period
        let mut rpm = [0i32; 2];
        let mut pos = [0i32; 2];
        let mut flips = 0;
        let mut last_sign = 0;
        let mut done_at = None;

        for i in 0..1500 {
            if ctl.update(pos[0], pos[1]) {
                done_at = Some(i);
                break;
            }
            let duty = [ctl.outputs().left as i32, ctl.outputs().right as i32];
            let sign = duty[0].signum();
            if sign != 0 {
                if last_sign != 0 && sign != last_sign {
                    flips += 1;
                }
                last_sign = sign;
            }
            for w in 0..2 {
                let steady = duty[w] * MAX_WHEEL_RPM / 100;
                rpm[w] += (steady - rpm[w]) / 4;
                pos[w] +=
                    rpm[w] * t.ticks_per_rev as i32 * t.loop_period_ms as i32 / 60_000;
            }
        }

        assert!(done_at.is_some(), "move never settled");
        // A braking reversal is fine; sustained oscillation is not
        assert!(flips <= 3, "duty flapped {} times", flips);
        // Duty is released at settle and stays released
        assert_eq!(ctl.outputs().left, 0);
        assert_eq!(ctl.outputs().right, 0);
        assert!(!ctl.update(pos[0], pos[1]));
        assert_eq!(ctl.outputs().left, 0);
    }

    #[test]
    fn test_leading_wheel_gets_less_duty() {
        let mut ctl = controller();
        ctl.command(DriveCommand::Straight {
            speed: 60,
            distance_mm: 500,
        });

        // Left wheel is running ahead of the right; the speed loop backs
        // it off while the right catches up
        ctl.update(20, 10);
        assert!(ctl.outputs().left < ctl.outputs().right);
    }
}
