//! Inter-task communication channels
//!
//! One mailbox per event-consuming service plus the command plumbing the
//! orchestrator uses to reach the other tasks. Uses embassy-sync
//! primitives for safe async communication; the interrupt gates are plain
//! atomics checked by the input tasks.

use core::sync::atomic::{AtomicBool, AtomicU16};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use binbot_core::behavior::MatchInfo;
use binbot_core::event::Event;
use binbot_core::timer::{Service, TimerId};
use binbot_drivers::drive::DriveCommand;

/// Mailbox capacity per service
const MAILBOX_SIZE: usize = 8;

/// Arm-request queue capacity (one dispatch can arm several slots)
const TIMER_QUEUE_SIZE: usize = 16;

/// Arm (or re-arm, cancelling the prior deadline) a countdown slot
#[derive(Debug, Clone, Copy)]
pub struct ArmRequest {
    pub id: TimerId,
    pub ms: u16,
}

/// Events for the Master behavior hierarchy
pub static MASTER_EVENTS: Channel<CriticalSectionRawMutex, Event, MAILBOX_SIZE> = Channel::new();

/// Events for the color sensor sequencer
pub static COLOR_EVENTS: Channel<CriticalSectionRawMutex, Event, MAILBOX_SIZE> = Channel::new();

/// Events for the referee link session
pub static COMPASS_EVENTS: Channel<CriticalSectionRawMutex, Event, MAILBOX_SIZE> = Channel::new();

/// Timer bank arm requests
pub static TIMER_REQUESTS: Channel<CriticalSectionRawMutex, ArmRequest, TIMER_QUEUE_SIZE> =
    Channel::new();

/// Drive command (updated by the orchestrator, latest wins)
pub static DRIVE_CMD: Signal<CriticalSectionRawMutex, DriveCommand> = Signal::new();

/// Match facts from the referee link (updated on change)
pub static MATCH_INFO: Signal<CriticalSectionRawMutex, MatchInfo> = Signal::new();

/// Beacon IR capture gate
pub static BEACON_IRQ_ENABLED: AtomicBool = AtomicBool::new(false);

/// Intake ball beam gate
pub static BALL_BEAM_IRQ_ENABLED: AtomicBool = AtomicBool::new(false);

/// Assigned beacon period in microseconds, zero until the team query
/// answers (read by the beacon capture task)
pub static BEACON_PERIOD_US: AtomicU16 = AtomicU16::new(0);

/// Deliver an event to the mailbox of the named service
pub async fn deliver(to: Service, event: Event) {
    match to {
        Service::Master => MASTER_EVENTS.send(event).await,
        Service::ColorSensor => COLOR_EVENTS.send(event).await,
        Service::Compass => COMPASS_EVENTS.send(event).await,
        // The drive loop consumes commands, not events
        Service::Drive => {}
    }
}
