//! Color sensing task
//!
//! Owns the bus sequencer and the classifier. A periodic sample timer
//! (and the ball beam, through its own task) kicks off RGBC reads; while
//! a sequence is suspended on the bus the task injects one `BusCheck`
//! per pass. Completed reads are classified and reported to the Master
//! mailbox as presence edges: `BallDetected` with the color code when a
//! ball first classifies, `BallGone` when the channel view clears.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::Timer;
use heapless::Vec;

use binbot_core::action::{Action, MAX_ACTIONS};
use binbot_core::color::BallColor;
use binbot_core::config::ColorWindows;
use binbot_core::event::{Event, EventKind};
use binbot_core::hsm::Hsm;
use binbot_core::timer::{Service, TimerId};
use binbot_drivers::color::{classify, SeqCtx, SeqState, SequenceId, Sequencer};

use crate::board::I2cBus;
use crate::channels::{
    ArmRequest, BALL_BEAM_IRQ_ENABLED, COLOR_EVENTS, MASTER_EVENTS, TIMER_REQUESTS,
};

/// Sampling period while watching for balls
const COLOR_POLL_MS: u16 = 100;

/// Busy-poll pacing while a sequence is in flight
const BUS_CHECK_MS: u64 = 1;

/// Bound on self-post pumping per dispatch
const PUMP_BUDGET: usize = 8;

#[embassy_executor::task]
pub async fn color_task(bus: I2cBus) {
    info!("Color task started");

    let mut seq = Sequencer::new(bus);
    let mut ctx = SeqCtx::default();
    let windows = ColorWindows::default();
    let mut ball_present = false;

    seq.start(&mut ctx, Event::entry());
    dispatch(
        &mut seq,
        &mut ctx,
        Event::with(EventKind::SequenceStart, SequenceId::PowerUp as u16),
    )
    .await;
    TIMER_REQUESTS
        .send(ArmRequest {
            id: TimerId::ColorSense,
            ms: COLOR_POLL_MS,
        })
        .await;

    loop {
        let event = if seq.state() == SeqState::Idle {
            COLOR_EVENTS.receive().await
        } else {
            // One bus poll per pass while suspended
            match select(COLOR_EVENTS.receive(), Timer::after_millis(BUS_CHECK_MS)).await {
                Either::First(ev) => ev,
                Either::Second(()) => Event::of(EventKind::BusCheck),
            }
        };

        let event = if event.is_timeout(TimerId::ColorSense) {
            TIMER_REQUESTS
                .send(ArmRequest {
                    id: TimerId::ColorSense,
                    ms: COLOR_POLL_MS,
                })
                .await;
            Event::with(EventKind::SequenceStart, SequenceId::ReadRgbc as u16)
        } else {
            event
        };

        let out = dispatch(&mut seq, &mut ctx, event).await;
        match out.kind {
            EventKind::SequenceDone if out.param == SequenceId::ReadRgbc as u16 => {
                let color = classify(&ctx.readings, &windows);
                report(&mut ball_present, color).await;
            }
            EventKind::Error => warn!("Color sensor bus error, sample dropped"),
            _ => {}
        }
    }
}

/// Run one event, resolve self-posts, and forward timer arms
async fn dispatch(seq: &mut Sequencer<I2cBus>, ctx: &mut SeqCtx, event: Event) -> Event {
    let mut out = seq.run(ctx, event);
    for _ in 0..PUMP_BUDGET {
        flush_arms(ctx).await;
        match ctx.outbox.pop_post_for(Service::ColorSensor) {
            Some(ev) => out = seq.run(ctx, ev),
            None => break,
        }
    }
    flush_arms(ctx).await;
    out
}

async fn flush_arms(ctx: &mut SeqCtx) {
    let actions: Vec<Action, MAX_ACTIONS> = ctx.outbox.take_actions().collect();
    for action in actions {
        if let Action::ArmTimer { id, ms } = action {
            TIMER_REQUESTS.send(ArmRequest { id, ms }).await;
        }
    }
}

/// Presence edge detection toward the Master mailbox
async fn report(present: &mut bool, color: BallColor) {
    if !BALL_BEAM_IRQ_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let now = color != BallColor::Unknown;
    if now && !*present {
        debug!("Ball classified: {:?}", color);
        MASTER_EVENTS
            .send(Event::with(EventKind::BallDetected, color.code()))
            .await;
    } else if !now && *present {
        MASTER_EVENTS.send(Event::of(EventKind::BallGone)).await;
    }
    *present = now;
}
