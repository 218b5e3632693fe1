//! BallDumping: cycle a storage door on request
//!
//! Flat two-state machine driven by `DumpRequested` posts from the
//! delivery runs. Opens the named door, holds it for the dump interval,
//! then closes it, zeroes that side of the ledger, and reports `DumpDone`
//! back toward the Master tree.

use super::BotCtx;
use crate::action::{Action, Door};
use crate::event::{Event, EventKind};
use crate::hsm::{Hsm, Transition};
use crate::timer::{Service, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DumpState {
    Idle,
    Dumping,
}

#[derive(Debug)]
pub struct BallDumping {
    state: DumpState,
    door: Door,
}

impl BallDumping {
    pub fn new() -> Self {
        Self {
            state: DumpState::Idle,
            door: Door::Recycle,
        }
    }
}

impl Default for BallDumping {
    fn default() -> Self {
        Self::new()
    }
}

impl Hsm for BallDumping {
    type Ctx = BotCtx;
    type State = DumpState;

    fn state(&self) -> DumpState {
        self.state
    }

    fn set_state(&mut self, next: DumpState) {
        self.state = next;
    }

    fn initial_state(&self) -> DumpState {
        DumpState::Idle
    }

    fn during(&mut self, ctx: &mut BotCtx, event: Event) -> Event {
        match (self.state, event.kind) {
            (DumpState::Idle, EventKind::DumpRequested) => {
                // Record which door before the table switches state
                self.door = Door::from_code(event.param);
                event
            }
            (DumpState::Dumping, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::OpenDoor(self.door));
                ctx.outbox.arm(TimerId::Dump, ctx.tuning.dump_ms);
                event
            }
            (DumpState::Dumping, EventKind::Exit) => {
                ctx.outbox.act(Action::CloseDoor(self.door));
                match self.door {
                    Door::Recycle => ctx.balls.clear_recycle(),
                    Door::Landfill => ctx.balls.clear_landfill(),
                }
                ctx.outbox.post(
                    Service::Master,
                    Event::with(EventKind::DumpDone, self.door.code()),
                );
                event
            }
            _ => event,
        }
    }

    fn decide(&mut self, _ctx: &mut BotCtx, event: Event) -> Transition<DumpState> {
        match (self.state, event.kind) {
            (DumpState::Idle, EventKind::DumpRequested) => Transition::to(DumpState::Dumping),
            (DumpState::Dumping, EventKind::Timeout) if event.is_timeout(TimerId::Dump) => {
                Transition::to(DumpState::Idle)
            }
            _ => Transition::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (BallDumping, BotCtx) {
        let mut sm = BallDumping::new();
        let mut ctx = BotCtx::default();
        sm.start(&mut ctx, Event::entry());
        ctx.outbox.clear();
        (sm, ctx)
    }

    #[test]
    fn test_dump_cycle_recycle_door() {
        let (mut sm, mut ctx) = setup();
        ctx.balls.add_recycle();
        ctx.balls.add_recycle();

        sm.run(
            &mut ctx,
            Event::with(EventKind::DumpRequested, Door::Recycle.code()),
        );
        assert_eq!(sm.state(), DumpState::Dumping);
        assert!(ctx
            .outbox
            .actions()
            .iter()
            .any(|a| matches!(a, Action::OpenDoor(Door::Recycle))));

        sm.run(&mut ctx, Event::timeout(TimerId::Dump));
        assert_eq!(sm.state(), DumpState::Idle);
        assert_eq!(ctx.balls.recycle_count(), 0);
        assert!(ctx
            .outbox
            .actions()
            .iter()
            .any(|a| matches!(a, Action::CloseDoor(Door::Recycle))));

        let posted = ctx.outbox.pop_post_for(Service::Master).unwrap();
        assert_eq!(posted.kind, EventKind::DumpDone);
        assert_eq!(posted.param, Door::Recycle.code());
    }

    #[test]
    fn test_dump_cycle_landfill_door() {
        let (mut sm, mut ctx) = setup();
        ctx.balls.add_landfill();

        sm.run(
            &mut ctx,
            Event::with(EventKind::DumpRequested, Door::Landfill.code()),
        );
        sm.run(&mut ctx, Event::timeout(TimerId::Dump));

        assert_eq!(ctx.balls.landfill_count(), 0);
        let posted = ctx.outbox.pop_post_for(Service::Master).unwrap();
        assert_eq!(posted.param, Door::Landfill.code());
    }

    #[test]
    fn test_request_while_dumping_ignored() {
        let (mut sm, mut ctx) = setup();
        sm.run(
            &mut ctx,
            Event::with(EventKind::DumpRequested, Door::Recycle.code()),
        );
        sm.run(
            &mut ctx,
            Event::with(EventKind::DumpRequested, Door::Landfill.code()),
        );
        assert_eq!(sm.state(), DumpState::Dumping);

        // The original door finishes its cycle
        sm.run(&mut ctx, Event::timeout(TimerId::Dump));
        let posted = ctx.outbox.pop_post_for(Service::Master).unwrap();
        assert_eq!(posted.param, Door::Recycle.code());
    }
}
