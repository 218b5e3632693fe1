//! Board output mapping and the color sensor bus adapter
//!
//! The orchestrator owns the local output peripherals (doors, status LED,
//! sort gate servo) and applies behavior actions to them here. The color
//! task owns the I2C bus through [`I2cBus`], which adapts the blocking
//! RP2040 controller to the sequencer's byte-bus seam.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::i2c::{self, Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};

use binbot_core::action::{Action, Door};
use binbot_core::traits::{BusError, BusPort, BusStatus};

/// Servo PWM frame: 1 MHz count clock, 50 Hz period
pub const SERVO_TOP: u16 = 19_999;

/// Center pulse width in counts (1.5 ms)
const SERVO_CENTER: i32 = 1_500;

/// Half travel in counts (full travel is 1.0-2.0 ms)
const SERVO_SPAN: i32 = 500;

/// TCS3472 bus address
const SENSOR_ADDR: u8 = 0x29;

/// Output peripherals driven directly by behavior actions
pub struct BoardOutputs {
    recycle_door: Output<'static>,
    landfill_door: Output<'static>,
    led: Output<'static>,
    sort_gate: Pwm<'static>,
    servo_config: PwmConfig,
}

impl BoardOutputs {
    pub fn new(
        recycle_door: Output<'static>,
        landfill_door: Output<'static>,
        led: Output<'static>,
        mut sort_gate: Pwm<'static>,
        mut servo_config: PwmConfig,
    ) -> Self {
        // Start with the gate centered
        servo_config.compare_a = SERVO_CENTER as u16;
        sort_gate.set_config(&servo_config);
        Self {
            recycle_door,
            landfill_door,
            led,
            sort_gate,
            servo_config,
        }
    }

    /// Apply one local output command
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::OpenDoor(Door::Recycle) => self.recycle_door.set_high(),
            Action::CloseDoor(Door::Recycle) => self.recycle_door.set_low(),
            Action::OpenDoor(Door::Landfill) => self.landfill_door.set_high(),
            Action::CloseDoor(Door::Landfill) => self.landfill_door.set_low(),
            Action::SetLed(true) => self.led.set_high(),
            Action::SetLed(false) => self.led.set_low(),
            Action::SetDuty { percent, .. } => {
                let pulse = SERVO_CENTER + percent as i32 * SERVO_SPAN / 100;
                self.servo_config.compare_a = pulse as u16;
                self.sort_gate.set_config(&self.servo_config);
            }
            other => warn!("Unroutable action: {:?}", other),
        }
    }
}

/// Blocking I2C adapter for the sequencer's byte-bus seam
///
/// Transfers complete inside the call, so the busy flag never reads set;
/// a failed transfer surfaces through the step result instead. A command
/// write only latches the register pointer; the bus transaction happens
/// with the data byte, which is how the TCS3472 expects register writes
/// to be framed.
pub struct I2cBus {
    i2c: I2c<'static, I2C0, Blocking>,
    reg: u8,
    byte: u8,
}

impl I2cBus {
    pub fn new(i2c: I2c<'static, I2C0, Blocking>) -> Self {
        Self {
            i2c,
            reg: 0,
            byte: 0,
        }
    }
}

fn map_err(e: i2c::Error) -> BusError {
    match e {
        i2c::Error::Abort(i2c::AbortReason::NoAcknowledge) => BusError::Nack,
        _ => BusError::Fault,
    }
}

impl BusPort for I2cBus {
    fn write_command(&mut self, value: u8) -> Result<(), BusError> {
        self.reg = value;
        Ok(())
    }

    fn write_byte(&mut self, value: u8) -> Result<(), BusError> {
        self.i2c
            .blocking_write(SENSOR_ADDR, &[self.reg, value])
            .map_err(map_err)
    }

    fn start_read(&mut self, reg: u8) -> Result<(), BusError> {
        let mut buf = [0u8; 1];
        self.i2c
            .blocking_write_read(SENSOR_ADDR, &[reg], &mut buf)
            .map_err(map_err)?;
        self.byte = buf[0];
        Ok(())
    }

    fn status(&mut self) -> BusStatus {
        BusStatus::default()
    }

    fn take_byte(&mut self) -> u8 {
        self.byte
    }
}
