//! Discrete input tasks
//!
//! Bumper, intake ball beam, and beacon IR receiver. The beam and beacon
//! are gated by the interrupt-enable atomics the behavior layer flips;
//! the bumper is always live (collision handling is the Master's call).

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Instant, Timer};

use binbot_core::event::{Event, EventKind};
use binbot_drivers::color::SequenceId;

use crate::channels::{
    BALL_BEAM_IRQ_ENABLED, BEACON_IRQ_ENABLED, BEACON_PERIOD_US, COLOR_EVENTS, MASTER_EVENTS,
};

/// Contact switch settle time
const DEBOUNCE_MS: u64 = 50;

/// Beam re-trigger holdoff
const BEAM_HOLDOFF_MS: u64 = 20;

/// Accepted deviation from the assigned beacon period
const BEACON_TOLERANCE_PCT: u32 = 10;

/// Consecutive in-window edges before alignment is declared
const ALIGN_EDGES: u8 = 4;

#[embassy_executor::task]
pub async fn bumper_task(mut pin: Input<'static>) {
    info!("Bumper task started");

    loop {
        pin.wait_for_falling_edge().await;
        debug!("Bumper hit");
        MASTER_EVENTS.send(Event::of(EventKind::BumperHit)).await;
        Timer::after_millis(DEBOUNCE_MS).await;
    }
}

/// Intake beam: a break requests an immediate color sample
#[embassy_executor::task]
pub async fn ball_beam_task(mut pin: Input<'static>) {
    info!("Ball beam task started");

    loop {
        pin.wait_for_falling_edge().await;
        if BALL_BEAM_IRQ_ENABLED.load(Ordering::Relaxed) {
            COLOR_EVENTS
                .send(Event::with(
                    EventKind::SequenceStart,
                    SequenceId::ReadRgbc as u16,
                ))
                .await;
        }
        Timer::after_millis(BEAM_HOLDOFF_MS).await;
    }
}

/// Beacon IR receiver: declares alignment after a run of edges whose
/// period matches the assigned beacon
#[embassy_executor::task]
pub async fn beacon_task(mut pin: Input<'static>) {
    info!("Beacon task started");

    let mut last_us: u32 = 0;
    let mut hits: u8 = 0;

    loop {
        pin.wait_for_rising_edge().await;
        let now_us = Instant::now().as_micros() as u32;
        let delta = now_us.wrapping_sub(last_us);
        last_us = now_us;

        if !BEACON_IRQ_ENABLED.load(Ordering::Relaxed) {
            hits = 0;
            continue;
        }
        let target = BEACON_PERIOD_US.load(Ordering::Relaxed) as u32;
        if target == 0 {
            continue;
        }

        let tolerance = target * BEACON_TOLERANCE_PCT / 100;
        if delta.abs_diff(target) <= tolerance {
            hits += 1;
            if hits >= ALIGN_EDGES {
                hits = 0;
                debug!("Beacon aligned at {} us", delta);
                MASTER_EVENTS
                    .send(Event::of(EventKind::BeaconAligned))
                    .await;
            }
        } else {
            hits = 0;
        }
    }
}
