//! Tuning configuration
//!
//! Plain data with `Default` impls. Values here are plausible bench
//! defaults, not match-tuned constants.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Behavior-layer timing and motion parameters
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BehaviorTuning {
    /// Delay between classifying a ball and actuating the sort gate (ms)
    pub sort_ms: u16,
    /// Dump door hold time (ms)
    pub dump_ms: u16,
    /// Ball-count poll period while collecting (ms)
    pub ball_poll_ms: u16,
    /// Upper bound on any beacon search (ms)
    pub collect_stop_ms: u16,
    /// Rotate-and-measure step period during beacon search (ms)
    pub localize_step_ms: u16,
    /// Upper bound on each collision-recovery step (ms)
    pub collision_step_ms: u16,
    /// Status LED blink period (ms)
    pub led_blink_ms: u16,
    /// Roaming speed while collecting (percent)
    pub roam_speed: u8,
    /// Approach speed toward a dump target (percent)
    pub approach_speed: u8,
    /// Speed for backup and recovery moves (percent)
    pub backup_speed: u8,
    /// In-place rotation speed (percent)
    pub rotate_speed: u8,
    /// Approach distance once aligned with a beacon (mm)
    pub approach_mm: i16,
    /// Backup distance after a dump or a collision (mm, negative = reverse)
    pub backup_mm: i16,
    /// Collision-recovery turn angle (degrees)
    pub quarter_turn_deg: i16,
    /// Rotation step per localize tick while searching (degrees)
    pub localize_step_deg: i16,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            sort_ms: 300,
            dump_ms: 1500,
            ball_poll_ms: 2000,
            collect_stop_ms: 8000,
            localize_step_ms: 150,
            collision_step_ms: 1200,
            led_blink_ms: 500,
            roam_speed: 40,
            approach_speed: 60,
            backup_speed: 50,
            rotate_speed: 30,
            approach_mm: 600,
            backup_mm: -150,
            quarter_turn_deg: 90,
            localize_step_deg: 10,
        }
    }
}

/// Drive control loop parameters
///
/// Gains are stored as value x1000 and converted to fixed point by the
/// drive controller.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriveTuning {
    /// Common-mode (distance) proportional gain x1000
    pub distance_kp_x1000: i32,
    /// Common-mode derivative gain x1000
    pub distance_kd_x1000: i32,
    /// Differential (heading) proportional gain x1000
    pub heading_kp_x1000: i32,
    /// Differential derivative gain x1000
    pub heading_kd_x1000: i32,
    /// Wheel speed loop proportional gain x1000
    pub speed_kp_x1000: i32,
    /// Wheel speed loop integral gain x1000
    pub speed_ki_x1000: i32,
    /// Duty command clamp (percent)
    pub duty_limit: i16,
    /// Integrator anti-windup clamp, in duty percent
    pub integral_limit: i16,
    /// Position error tolerance for move completion (encoder ticks)
    pub position_tolerance_ticks: i32,
    /// Encoder ticks per wheel revolution
    pub ticks_per_rev: u16,
    /// Wheel circumference (mm)
    pub wheel_circumference_mm: u16,
    /// Distance between wheel contact points (mm)
    pub track_width_mm: u16,
    /// Control loop period (ms)
    pub loop_period_ms: u16,
}

impl Default for DriveTuning {
    fn default() -> Self {
        Self {
            distance_kp_x1000: 800,
            distance_kd_x1000: 120,
            heading_kp_x1000: 1200,
            heading_kd_x1000: 150,
            speed_kp_x1000: 600,
            speed_ki_x1000: 80,
            duty_limit: 100,
            integral_limit: 60,
            position_tolerance_ticks: 12,
            ticks_per_rev: 512,
            wheel_circumference_mm: 220,
            track_width_mm: 180,
            loop_period_ms: 20,
        }
    }
}

/// Inclusive percentage range for one color channel
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PctRange {
    pub min: u8,
    pub max: u8,
}

impl PctRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, pct: u8) -> bool {
        self.min <= pct && pct <= self.max
    }
}

/// Per-channel percentage windows defining one ball color
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorWindow {
    pub red: PctRange,
    pub green: PctRange,
    pub blue: PctRange,
}

/// Calibration windows for all classifiable colors
///
/// Defaults are bench placeholders; recalibrate against the mounted
/// sensor before competition.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorWindows {
    pub red: ColorWindow,
    pub green: ColorWindow,
    pub blue: ColorWindow,
    pub yellow: ColorWindow,
    /// Minimum clear channel value for any classification attempt
    pub min_clear: u16,
}

impl Default for ColorWindows {
    fn default() -> Self {
        Self {
            red: ColorWindow {
                red: PctRange::new(45, 80),
                green: PctRange::new(5, 30),
                blue: PctRange::new(5, 30),
            },
            green: ColorWindow {
                red: PctRange::new(5, 30),
                green: PctRange::new(40, 75),
                blue: PctRange::new(10, 35),
            },
            blue: ColorWindow {
                red: PctRange::new(5, 25),
                green: PctRange::new(10, 40),
                blue: PctRange::new(40, 80),
            },
            yellow: ColorWindow {
                red: PctRange::new(35, 65),
                green: PctRange::new(30, 60),
                blue: PctRange::new(0, 20),
            },
            min_clear: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_range_inclusive() {
        let r = PctRange::new(10, 20);
        assert!(r.contains(10));
        assert!(r.contains(20));
        assert!(!r.contains(9));
        assert!(!r.contains(21));
    }

    #[test]
    fn test_defaults_sane() {
        let b = BehaviorTuning::default();
        assert!(b.backup_mm < 0);
        assert!(b.collect_stop_ms > b.localize_step_ms);

        let d = DriveTuning::default();
        assert!(d.duty_limit <= 100);
        assert!(d.integral_limit <= d.duty_limit);
    }
}
