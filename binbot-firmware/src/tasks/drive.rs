//! Drive control loop and encoder capture
//!
//! Two edge-capture tasks stand in for the encoder ISRs: each waits on
//! its wheel's A channel, samples the B channel for direction, and folds
//! the edge into the shared tick capture. The control task runs the
//! closed-loop controller once per period against the captured positions
//! and reports `MoveCompleted` to the Master mailbox when a commanded
//! move settles.

use core::cell::RefCell;

use defmt::*;
use embassy_rp::gpio::{Input, Output};
use embassy_rp::pwm::PwmOutput;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant, Ticker};

use binbot_core::config::DriveTuning;
use binbot_core::event::{Event, EventKind};
use binbot_core::motion::TickCapture;
use binbot_drivers::drive::{DriveCommand, DriveController, PwmWheels};

use crate::channels::{DRIVE_CMD, MASTER_EVENTS};

/// Wheel indexes into the shared capture array
pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;

/// The concrete drive base on this board
pub type Wheels =
    PwmWheels<PwmOutput<'static>, Output<'static>, PwmOutput<'static>, Output<'static>>;

/// Tick captures shared between the capture tasks and the control loop
static ENCODERS: Mutex<CriticalSectionRawMutex, RefCell<[TickCapture; 2]>> =
    Mutex::new(RefCell::new([TickCapture::new(), TickCapture::new()]));

/// Encoder edge capture, one instance per wheel
#[embassy_executor::task(pool_size = 2)]
pub async fn encoder_task(index: usize, mut pin_a: Input<'static>, pin_b: Input<'static>) {
    info!("Encoder task started (wheel {})", index);

    loop {
        pin_a.wait_for_rising_edge().await;
        let forward = pin_b.is_high();
        let now_us = Instant::now().as_micros() as u32;
        ENCODERS.lock(|e| e.borrow_mut()[index].capture(now_us, forward));
    }
}

#[embassy_executor::task]
pub async fn drive_task(wheels: Wheels) {
    info!("Drive task started");

    let tuning = DriveTuning::default();
    let period = tuning.loop_period_ms;
    let mut controller = DriveController::new(wheels, tuning);
    let mut ticker = Ticker::every(Duration::from_millis(period as u64));

    loop {
        ticker.next().await;

        if let Some(cmd) = DRIVE_CMD.try_take() {
            debug!("Drive command: {:?}", cmd);
            if cmd != DriveCommand::Stop {
                // Position accounting restarts from zero with each move
                ENCODERS.lock(|e| {
                    let mut captures = e.borrow_mut();
                    captures[LEFT].reset();
                    captures[RIGHT].reset();
                });
            }
            controller.command(cmd);
        }

        let (left, right) = ENCODERS.lock(|e| {
            let captures = e.borrow();
            (captures[LEFT].position(), captures[RIGHT].position())
        });

        if controller.update(left, right) {
            debug!("Move completed at ({}, {}) ticks", left, right);
            MASTER_EVENTS.send(Event::of(EventKind::MoveCompleted)).await;
        }
    }
}
