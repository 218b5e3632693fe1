//! Binbot - trash-sorting competition robot firmware
//!
//! Main firmware binary for RP2040-based boards. Wires the behavior
//! hierarchy, color sequencer, referee link session, and drive loop to
//! the board peripherals; one Embassy task per service, talking over
//! static channels.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use fixed::traits::ToFixed;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use binbot_drivers::drive::{HBridgeWheel, PwmWheels};

use crate::board::{BoardOutputs, I2cBus, SERVO_TOP};
use crate::tasks::drive::{LEFT, RIGHT};

mod board;
mod channels;
mod tasks;

/// Our team number on the referee link
const TEAM: u8 = 3;

/// Wheel PWM carrier: 125 MHz / 6250 = 20 kHz
const WHEEL_PWM_TOP: u16 = 6_249;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Binbot firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Referee link UART (slow byte-at-a-time device)
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 9600;
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let (tx, rx) = uart
        .into_buffered(Irqs, TX_BUF.init([0u8; 64]), RX_BUF.init([0u8; 64]))
        .split();

    // Color sensor I2C
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c::Config::default());
    let bus = I2cBus::new(i2c);

    // Wheel PWM + direction pins
    let mut wheel_config = PwmConfig::default();
    wheel_config.top = WHEEL_PWM_TOP;
    let (left_out, _) = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, wheel_config.clone()).split();
    let (right_out, _) = Pwm::new_output_a(p.PWM_SLICE1, p.PIN_18, wheel_config).split();
    let left = HBridgeWheel::new(left_out.unwrap(), Output::new(p.PIN_17, Level::Low), false);
    // The right motor is mirrored on the chassis
    let right = HBridgeWheel::new(right_out.unwrap(), Output::new(p.PIN_19, Level::Low), true);
    let wheels = PwmWheels::new(left, right);

    // Sort gate servo: 1 MHz count clock, 50 Hz frame
    let mut servo_config = PwmConfig::default();
    servo_config.divider = 125i32.to_fixed();
    servo_config.top = SERVO_TOP;
    let sort_gate = Pwm::new_output_a(p.PWM_SLICE2, p.PIN_20, servo_config.clone());

    let board = BoardOutputs::new(
        Output::new(p.PIN_21, Level::Low),
        Output::new(p.PIN_22, Level::Low),
        Output::new(p.PIN_25, Level::Low),
        sort_gate,
        servo_config,
    );

    info!("Outputs initialized");

    // Encoders and discrete inputs
    let left_a = Input::new(p.PIN_10, Pull::Up);
    let left_b = Input::new(p.PIN_11, Pull::Up);
    let right_a = Input::new(p.PIN_12, Pull::Up);
    let right_b = Input::new(p.PIN_13, Pull::Up);
    let bumper = Input::new(p.PIN_14, Pull::Up);
    let beam = Input::new(p.PIN_15, Pull::Up);
    let beacon = Input::new(p.PIN_9, Pull::Up);

    // Spawn tasks
    spawner.spawn(tasks::timer_bank_task()).unwrap();
    spawner.spawn(tasks::orchestrator_task(board)).unwrap();
    spawner.spawn(tasks::color_task(bus)).unwrap();
    spawner.spawn(tasks::referee_task(tx, TEAM)).unwrap();
    spawner.spawn(tasks::referee_rx_task(rx)).unwrap();
    spawner
        .spawn(tasks::encoder_task(LEFT, left_a, left_b))
        .unwrap();
    spawner
        .spawn(tasks::encoder_task(RIGHT, right_a, right_b))
        .unwrap();
    spawner.spawn(tasks::drive_task(wheels)).unwrap();
    spawner.spawn(tasks::bumper_task(bumper)).unwrap();
    spawner.spawn(tasks::ball_beam_task(beam)).unwrap();
    spawner.spawn(tasks::beacon_task(beacon)).unwrap();

    info!("All tasks spawned, firmware running");

    // All work happens in the spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
