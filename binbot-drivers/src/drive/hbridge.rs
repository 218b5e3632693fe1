//! H-bridge PWM wheel outputs
//!
//! Maps the signed duty commands from the drive controller onto a PWM
//! magnitude pin and a direction pin per wheel.

use binbot_core::traits::WheelOutputs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

/// One wheel behind an H-bridge: PWM magnitude plus direction pin
pub struct HBridgeWheel<P, D> {
    pwm: P,
    dir: D,
    /// Swap for the mirrored motor on the other side of the chassis
    inverted: bool,
}

impl<P: SetDutyCycle, D: OutputPin> HBridgeWheel<P, D> {
    pub fn new(pwm: P, dir: D, inverted: bool) -> Self {
        Self { pwm, dir, inverted }
    }

    /// Apply a signed duty percentage
    pub fn drive(&mut self, duty_pct: i16) {
        let forward = (duty_pct >= 0) != self.inverted;
        if forward {
            let _ = self.dir.set_high();
        } else {
            let _ = self.dir.set_low();
        }
        let magnitude = duty_pct.unsigned_abs().min(100) as u8;
        let _ = self.pwm.set_duty_cycle_percent(magnitude);
    }
}

/// A drive base of two H-bridge wheels
pub struct PwmWheels<LP, LD, RP, RD> {
    left: HBridgeWheel<LP, LD>,
    right: HBridgeWheel<RP, RD>,
}

impl<LP, LD, RP, RD> PwmWheels<LP, LD, RP, RD>
where
    LP: SetDutyCycle,
    LD: OutputPin,
    RP: SetDutyCycle,
    RD: OutputPin,
{
    pub fn new(left: HBridgeWheel<LP, LD>, right: HBridgeWheel<RP, RD>) -> Self {
        Self { left, right }
    }
}

impl<LP, LD, RP, RD> WheelOutputs for PwmWheels<LP, LD, RP, RD>
where
    LP: SetDutyCycle,
    LD: OutputPin,
    RP: SetDutyCycle,
    RD: OutputPin,
{
    fn set_duty(&mut self, left_pct: i16, right_pct: i16) {
        self.left.drive(left_pct);
        self.right.drive(right_pct);
    }
}
