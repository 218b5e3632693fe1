//! Countdown timer slots and service names
//!
//! The timer substrate offers sixteen independent countdown slots. Each
//! slot used by the firmware is statically bound to the service whose
//! mailbox receives the `Timeout` event on expiry. Re-arming a slot
//! implicitly cancels its prior deadline.

/// Named event consumers (one top-level state machine each)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Service {
    /// Master behavior hierarchy (also hosts ball accounting machines)
    Master,
    /// Color sensor bus sequencer
    ColorSensor,
    /// Referee serial link session
    Compass,
    /// Drive control loop
    Drive,
}

/// Countdown timer slots in use
///
/// The substrate has sixteen slots; these are the ones the firmware arms.
/// The discriminant is the slot number and doubles as the `Timeout` param.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum TimerId {
    /// Bounds any beacon-search state
    CollectStop = 0,
    /// Paces collision-recovery steps
    Collision = 1,
    /// Periodic color sensor sampling
    ColorSense = 2,
    /// Ball sort gate actuation delay
    Processing = 3,
    /// Dump door hold time
    Dump = 4,
    /// Status LED blink
    LedBlink = 5,
    /// Referee link byte-poll period
    CompassByte = 6,
    /// Referee link full-refresh period
    CompassRefresh = 7,
    /// Rotate-and-measure step during beacon search
    Localize = 8,
    /// Ball-count poll while collecting
    BallCollection = 9,
    /// Bus sequencer settle delay
    BusTransaction = 10,
}

impl TimerId {
    /// Recover a slot from a `Timeout` event parameter
    pub const fn from_param(param: u16) -> Option<Self> {
        Some(match param {
            0 => TimerId::CollectStop,
            1 => TimerId::Collision,
            2 => TimerId::ColorSense,
            3 => TimerId::Processing,
            4 => TimerId::Dump,
            5 => TimerId::LedBlink,
            6 => TimerId::CompassByte,
            7 => TimerId::CompassRefresh,
            8 => TimerId::Localize,
            9 => TimerId::BallCollection,
            10 => TimerId::BusTransaction,
            _ => return None,
        })
    }

    /// The service whose mailbox receives this slot's expiry event
    pub const fn destination(self) -> Service {
        match self {
            TimerId::CollectStop
            | TimerId::Collision
            | TimerId::Processing
            | TimerId::Dump
            | TimerId::LedBlink
            | TimerId::Localize
            | TimerId::BallCollection => Service::Master,
            TimerId::ColorSense | TimerId::BusTransaction => Service::ColorSensor,
            TimerId::CompassByte | TimerId::CompassRefresh => Service::Compass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_param_roundtrip() {
        for id in [
            TimerId::CollectStop,
            TimerId::Collision,
            TimerId::ColorSense,
            TimerId::Processing,
            TimerId::Dump,
            TimerId::LedBlink,
            TimerId::CompassByte,
            TimerId::CompassRefresh,
            TimerId::Localize,
            TimerId::BallCollection,
            TimerId::BusTransaction,
        ] {
            assert_eq!(TimerId::from_param(id as u16), Some(id));
        }
        assert_eq!(TimerId::from_param(15), None);
    }

    #[test]
    fn test_destinations() {
        assert_eq!(TimerId::Dump.destination(), Service::Master);
        assert_eq!(TimerId::BusTransaction.destination(), Service::ColorSensor);
        assert_eq!(TimerId::CompassByte.destination(), Service::Compass);
    }

    proptest! {
        #[test]
        fn prop_param_decode_consistent(param in any::<u16>()) {
            match TimerId::from_param(param) {
                Some(id) => {
                    // Decoding is the inverse of the discriminant, and
                    // every live slot has a delivery target
                    prop_assert_eq!(id as u16, param);
                    let _ = id.destination();
                }
                None => prop_assert!(param > TimerId::BusTransaction as u16),
            }
        }
    }
}
