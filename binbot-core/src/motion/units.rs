//! Unit conversions between commanded moves and encoder ticks

/// Measured RPM from a tick delta over one control period
pub fn rpm_from_ticks(delta_ticks: i32, dt_ms: u16, ticks_per_rev: u16) -> i16 {
    if dt_ms == 0 || ticks_per_rev == 0 {
        return 0;
    }
    // rev/min = (ticks / ticks_per_rev) * (60_000 / dt_ms)
    let num = delta_ticks as i64 * 60_000;
    let den = ticks_per_rev as i64 * dt_ms as i64;
    (num / den).clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Encoder ticks corresponding to a straight-line distance
pub fn ticks_for_distance(distance_mm: i16, circumference_mm: u16, ticks_per_rev: u16) -> i32 {
    if circumference_mm == 0 {
        return 0;
    }
    (distance_mm as i32 * ticks_per_rev as i32) / circumference_mm as i32
}

/// Per-wheel tick target for an in-place rotation
///
/// Each wheel travels an arc of `pi * track_width * angle / 360`; the
/// wheels turn in opposite directions. Uses the 355/113 approximation to
/// stay in integer math.
pub fn wheel_ticks_for_rotation(
    angle_deg: i16,
    track_width_mm: u16,
    circumference_mm: u16,
    ticks_per_rev: u16,
) -> i32 {
    if circumference_mm == 0 {
        return 0;
    }
    let arc_mm = (angle_deg as i64 * track_width_mm as i64 * 355) / (113 * 360);
    ((arc_mm * ticks_per_rev as i64) / circumference_mm as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpm_basic() {
        // 512 ticks/rev, 512 ticks in 1000ms = 1 rev/s = 60 rpm
        assert_eq!(rpm_from_ticks(512, 1000, 512), 60);
        assert_eq!(rpm_from_ticks(-512, 1000, 512), -60);
        assert_eq!(rpm_from_ticks(0, 1000, 512), 0);
    }

    #[test]
    fn test_rpm_short_period() {
        // 20ms loop, 17 ticks: (17/512) rev * 3000 periods/min = ~99 rpm
        assert_eq!(rpm_from_ticks(17, 20, 512), 99);
    }

    #[test]
    fn test_rpm_degenerate() {
        assert_eq!(rpm_from_ticks(100, 0, 512), 0);
        assert_eq!(rpm_from_ticks(100, 20, 0), 0);
    }

    #[test]
    fn test_distance_ticks() {
        // One full circumference = one rev of ticks
        assert_eq!(ticks_for_distance(220, 220, 512), 512);
        assert_eq!(ticks_for_distance(-110, 220, 512), -256);
    }

    #[test]
    fn test_rotation_ticks_symmetry() {
        let cw = wheel_ticks_for_rotation(90, 180, 220, 512);
        let ccw = wheel_ticks_for_rotation(-90, 180, 220, 512);
        assert_eq!(cw, -ccw);
        // 90 degrees on a 180mm track: arc = pi*180/4 = ~141mm -> ~329 ticks
        assert!((300..360).contains(&cw));
    }
}
