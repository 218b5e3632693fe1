//! Recycling run: deliver stored recyclables to the active station
//!
//! Orient toward the recycling beacon by rotate-and-measure, drive in,
//! dump on bumper contact, back away, then report completion. The beacon
//! search is bounded: if no alignment arrives before the collect-stop
//! timer, the timeout wins and the approach starts anyway (an occluded
//! beacon must not stall the match).

use super::BotCtx;
use crate::action::{Action, Door, IrqSource};
use crate::event::{Event, EventKind};
use crate::hsm::{Hsm, Transition};
use crate::timer::{Service, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecyclingState {
    /// Rotate-and-measure beacon search
    Locating,
    /// Driving toward the station
    Approaching,
    /// Door open, waiting for the dump cycle
    Dumping,
    /// Reversing clear of the station
    BackingUp,
}

#[derive(Debug)]
pub struct Recycling {
    state: RecyclingState,
}

impl Recycling {
    pub fn new() -> Self {
        Self {
            state: RecyclingState::Locating,
        }
    }
}

impl Default for Recycling {
    fn default() -> Self {
        Self::new()
    }
}

impl Hsm for Recycling {
    type Ctx = BotCtx;
    type State = RecyclingState;

    fn state(&self) -> RecyclingState {
        self.state
    }

    fn set_state(&mut self, next: RecyclingState) {
        self.state = next;
    }

    fn initial_state(&self) -> RecyclingState {
        RecyclingState::Locating
    }

    fn during(&mut self, ctx: &mut BotCtx, event: Event) -> Event {
        let t = &ctx.tuning;
        match (self.state, event.kind) {
            (RecyclingState::Locating, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::EnableIrq(IrqSource::Beacon));
                ctx.outbox.arm(TimerId::CollectStop, t.collect_stop_ms);
                ctx.outbox.arm(TimerId::Localize, t.localize_step_ms);
                ctx.outbox.act(Action::DriveRotate {
                    speed: t.rotate_speed,
                    angle_deg: t.localize_step_deg,
                });
                event
            }
            (RecyclingState::Locating, EventKind::Timeout)
                if event.is_timeout(TimerId::Localize) =>
            {
                // Next rotate-and-measure step
                ctx.outbox.arm(TimerId::Localize, t.localize_step_ms);
                ctx.outbox.act(Action::DriveRotate {
                    speed: t.rotate_speed,
                    angle_deg: t.localize_step_deg,
                });
                Event::none()
            }
            (RecyclingState::Locating, EventKind::Exit) => {
                ctx.outbox.act(Action::DisableIrq(IrqSource::Beacon));
                ctx.outbox.act(Action::StopDrive);
                event
            }
            (RecyclingState::Approaching, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::DriveStraight {
                    speed: t.approach_speed,
                    distance_mm: t.approach_mm,
                });
                event
            }
            (RecyclingState::Approaching, EventKind::Exit) => {
                ctx.outbox.act(Action::StopDrive);
                event
            }
            (RecyclingState::Dumping, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::StopDrive);
                ctx.outbox.post(
                    Service::Master,
                    Event::with(EventKind::DumpRequested, Door::Recycle.code()),
                );
                event
            }
            (RecyclingState::BackingUp, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::DriveStraight {
                    speed: t.backup_speed,
                    distance_mm: t.backup_mm,
                });
                event
            }
            (RecyclingState::BackingUp, EventKind::MoveCompleted) => {
                Event::of(EventKind::RecyclingDone)
            }
            _ => event,
        }
    }

    fn decide(&mut self, _ctx: &mut BotCtx, event: Event) -> Transition<RecyclingState> {
        match (self.state, event.kind) {
            (RecyclingState::Locating, EventKind::BeaconAligned) => {
                Transition::to(RecyclingState::Approaching)
            }
            // Bounded search: the timeout dominates a missing alignment
            (RecyclingState::Locating, EventKind::Timeout)
                if event.is_timeout(TimerId::CollectStop) =>
            {
                Transition::to(RecyclingState::Approaching)
            }
            // The bump against the station is the dump trigger, not a
            // collision; consume it here so Master never sees it.
            (RecyclingState::Approaching, EventKind::BumperHit)
            | (RecyclingState::Approaching, EventKind::MoveCompleted) => {
                Transition::to(RecyclingState::Dumping)
            }
            // The accepting station moved mid-approach; search again
            (RecyclingState::Approaching, EventKind::StationChanged) => {
                Transition::to(RecyclingState::Locating)
            }
            (RecyclingState::Dumping, EventKind::DumpDone)
                if event.param == Door::Recycle.code() =>
            {
                Transition::to(RecyclingState::BackingUp)
            }
            // RecyclingDone stays visible so GamePlay's table can act on it
            _ => Transition::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Recycling, BotCtx) {
        let mut sm = Recycling::new();
        let mut ctx = BotCtx::default();
        sm.start(&mut ctx, Event::entry());
        ctx.outbox.clear();
        (sm, ctx)
    }

    #[test]
    fn test_full_run() {
        let (mut sm, mut ctx) = setup();

        sm.run(&mut ctx, Event::with(EventKind::BeaconAligned, 2));
        assert_eq!(sm.state(), RecyclingState::Approaching);

        let out = sm.run(&mut ctx, Event::with(EventKind::BumperHit, 0));
        assert!(out.is_none()); // dump trigger is consumed, never bubbles
        assert_eq!(sm.state(), RecyclingState::Dumping);

        sm.run(
            &mut ctx,
            Event::with(EventKind::DumpDone, Door::Recycle.code()),
        );
        assert_eq!(sm.state(), RecyclingState::BackingUp);

        let out = sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        assert_eq!(out.kind, EventKind::RecyclingDone);
    }

    #[test]
    fn test_search_timeout_dominates() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::timeout(TimerId::CollectStop));
        assert_eq!(sm.state(), RecyclingState::Approaching);
    }

    #[test]
    fn test_localize_tick_keeps_searching() {
        let (mut sm, mut ctx) = setup();
        let out = sm.run(&mut ctx, Event::timeout(TimerId::Localize));
        assert!(out.is_none());
        assert_eq!(sm.state(), RecyclingState::Locating);
        // Another rotation step was commanded
        assert!(ctx
            .outbox
            .actions()
            .iter()
            .any(|a| matches!(a, Action::DriveRotate { .. })));
    }

    #[test]
    fn test_station_change_restarts_search() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::of(EventKind::BeaconAligned));
        assert_eq!(sm.state(), RecyclingState::Approaching);
        ctx.outbox.clear();

        let out = sm.run(&mut ctx, Event::with(EventKind::StationChanged, 1));
        assert!(out.is_none());
        assert_eq!(sm.state(), RecyclingState::Locating);
        // The search re-armed its bound
        assert!(ctx.outbox.actions().iter().any(|a| matches!(
            a,
            Action::ArmTimer {
                id: TimerId::CollectStop,
                ..
            }
        )));
    }

    #[test]
    fn test_dump_requested_on_entry() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::of(EventKind::BeaconAligned));
        ctx.outbox.clear();

        sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        assert_eq!(sm.state(), RecyclingState::Dumping);
        let posted = ctx.outbox.pop_post_for(Service::Master).unwrap();
        assert_eq!(posted.kind, EventKind::DumpRequested);
        assert_eq!(posted.param, Door::Recycle.code());
    }

    #[test]
    fn test_wrong_door_dump_ignored() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::of(EventKind::BeaconAligned));
        sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));

        sm.run(
            &mut ctx,
            Event::with(EventKind::DumpDone, Door::Landfill.code()),
        );
        assert_eq!(sm.state(), RecyclingState::Dumping);
    }
}
