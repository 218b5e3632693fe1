//! Landfilling run: haul unsortable balls to the landfill zone
//!
//! Same shape as a recycling run but aimed at the landfill corner, whose
//! floor edge is marked with tape: the approach stops on tape detection
//! as well as on bumper contact, and the landfill door is the one cycled.

use super::BotCtx;
use crate::action::{Action, Door, IrqSource};
use crate::event::{Event, EventKind};
use crate::hsm::{Hsm, Transition};
use crate::timer::{Service, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LandfillingState {
    Locating,
    Approaching,
    Dumping,
    BackingUp,
}

#[derive(Debug)]
pub struct Landfilling {
    state: LandfillingState,
}

impl Landfilling {
    pub fn new() -> Self {
        Self {
            state: LandfillingState::Locating,
        }
    }
}

impl Default for Landfilling {
    fn default() -> Self {
        Self::new()
    }
}

impl Hsm for Landfilling {
    type Ctx = BotCtx;
    type State = LandfillingState;

    fn state(&self) -> LandfillingState {
        self.state
    }

    fn set_state(&mut self, next: LandfillingState) {
        self.state = next;
    }

    fn initial_state(&self) -> LandfillingState {
        LandfillingState::Locating
    }

    fn during(&mut self, ctx: &mut BotCtx, event: Event) -> Event {
        let t = &ctx.tuning;
        match (self.state, event.kind) {
            (LandfillingState::Locating, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::EnableIrq(IrqSource::Beacon));
                ctx.outbox.arm(TimerId::CollectStop, t.collect_stop_ms);
                ctx.outbox.arm(TimerId::Localize, t.localize_step_ms);
                ctx.outbox.act(Action::DriveRotate {
                    speed: t.rotate_speed,
                    angle_deg: t.localize_step_deg,
                });
                event
            }
            (LandfillingState::Locating, EventKind::Timeout)
                if event.is_timeout(TimerId::Localize) =>
            {
                ctx.outbox.arm(TimerId::Localize, t.localize_step_ms);
                ctx.outbox.act(Action::DriveRotate {
                    speed: t.rotate_speed,
                    angle_deg: t.localize_step_deg,
                });
                Event::none()
            }
            (LandfillingState::Locating, EventKind::Exit) => {
                ctx.outbox.act(Action::DisableIrq(IrqSource::Beacon));
                ctx.outbox.act(Action::StopDrive);
                event
            }
            (LandfillingState::Approaching, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::DriveStraight {
                    speed: t.approach_speed,
                    distance_mm: t.approach_mm,
                });
                event
            }
            (LandfillingState::Approaching, EventKind::Exit) => {
                ctx.outbox.act(Action::StopDrive);
                event
            }
            (LandfillingState::Dumping, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::StopDrive);
                ctx.outbox.post(
                    Service::Master,
                    Event::with(EventKind::DumpRequested, Door::Landfill.code()),
                );
                event
            }
            (LandfillingState::BackingUp, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::DriveStraight {
                    speed: t.backup_speed,
                    distance_mm: t.backup_mm,
                });
                event
            }
            (LandfillingState::BackingUp, EventKind::MoveCompleted) => {
                Event::of(EventKind::LandfillingDone)
            }
            _ => event,
        }
    }

    fn decide(&mut self, _ctx: &mut BotCtx, event: Event) -> Transition<LandfillingState> {
        match (self.state, event.kind) {
            (LandfillingState::Locating, EventKind::BeaconAligned) => {
                Transition::to(LandfillingState::Approaching)
            }
            (LandfillingState::Locating, EventKind::Timeout)
                if event.is_timeout(TimerId::CollectStop) =>
            {
                Transition::to(LandfillingState::Approaching)
            }
            // Tape marks the zone edge; bumper means we reached the wall.
            // Either ends the approach, and neither may bubble to Master.
            (LandfillingState::Approaching, EventKind::TapeDetected)
            | (LandfillingState::Approaching, EventKind::BumperHit)
            | (LandfillingState::Approaching, EventKind::MoveCompleted) => {
                Transition::to(LandfillingState::Dumping)
            }
            (LandfillingState::Dumping, EventKind::DumpDone)
                if event.param == Door::Landfill.code() =>
            {
                Transition::to(LandfillingState::BackingUp)
            }
            _ => Transition::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Landfilling, BotCtx) {
        let mut sm = Landfilling::new();
        let mut ctx = BotCtx::default();
        sm.start(&mut ctx, Event::entry());
        ctx.outbox.clear();
        (sm, ctx)
    }

    #[test]
    fn test_tape_ends_approach() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::of(EventKind::BeaconAligned));
        assert_eq!(sm.state(), LandfillingState::Approaching);

        let out = sm.run(&mut ctx, Event::of(EventKind::TapeDetected));
        assert!(out.is_none());
        assert_eq!(sm.state(), LandfillingState::Dumping);
    }

    #[test]
    fn test_completion_event() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::timeout(TimerId::CollectStop));
        sm.run(&mut ctx, Event::with(EventKind::BumperHit, 2));
        sm.run(
            &mut ctx,
            Event::with(EventKind::DumpDone, Door::Landfill.code()),
        );
        assert_eq!(sm.state(), LandfillingState::BackingUp);

        let out = sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        assert_eq!(out.kind, EventKind::LandfillingDone);
    }

    #[test]
    fn test_landfill_door_requested() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::of(EventKind::BeaconAligned));
        sm.run(&mut ctx, Event::of(EventKind::TapeDetected));

        let posted = ctx.outbox.pop_post_for(Service::Master).unwrap();
        assert_eq!(posted.kind, EventKind::DumpRequested);
        assert_eq!(posted.param, Door::Landfill.code());
    }
}
