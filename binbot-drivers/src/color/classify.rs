//! Window classification of RGBC readings
//!
//! Each candidate color is a set of per-channel percentage windows; a
//! reading matches a color only when every channel falls inside its own
//! window independently. Readings below the clear-channel floor are
//! treated as "no ball" and classify as Unknown.

use binbot_core::color::{BallColor, ChannelReadings};
use binbot_core::config::{ColorWindow, ColorWindows};

fn matches_window(readings: &ChannelReadings, window: &ColorWindow) -> bool {
    window.red.contains(readings.percent_of_clear(readings.red))
        && window.green.contains(readings.percent_of_clear(readings.green))
        && window.blue.contains(readings.percent_of_clear(readings.blue))
}

/// Map one acquisition to a ball color
///
/// Windows are checked in a fixed order; calibration is expected to keep
/// them disjoint, and the first match wins if they overlap.
pub fn classify(readings: &ChannelReadings, windows: &ColorWindows) -> BallColor {
    if readings.clear < windows.min_clear {
        return BallColor::Unknown;
    }

    let candidates = [
        (BallColor::Red, &windows.red),
        (BallColor::Green, &windows.green),
        (BallColor::Blue, &windows.blue),
        (BallColor::Yellow, &windows.yellow),
    ];

    for (color, window) in candidates {
        if matches_window(readings, window) {
            return color;
        }
    }
    BallColor::Unknown
}
