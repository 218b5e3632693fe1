//! GamePlay: the collect/deliver cycle
//!
//! Roams the field collecting balls until the periodic ball-count poll
//! finds something to deliver, then runs the matching sub-hierarchy.
//! Completion events from the sub-runs route back here and restart the
//! poll; they are re-exposed (not consumed) so Master-level observers
//! also see them.

use super::{BotCtx, Landfilling, Recycling};
use crate::action::Action;
use crate::event::{Event, EventKind};
use crate::hsm::{Hsm, Transition};
use crate::timer::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayState {
    CollectingGarbage,
    Recycling,
    Landfilling,
}

#[derive(Debug)]
pub struct GamePlay {
    state: PlayState,
    recycling: Recycling,
    landfilling: Landfilling,
}

impl GamePlay {
    pub fn new() -> Self {
        Self {
            state: PlayState::CollectingGarbage,
            recycling: Recycling::new(),
            landfilling: Landfilling::new(),
        }
    }

    /// Current sub-state of the recycling run (test/telemetry hook)
    pub fn recycling_state(&self) -> super::RecyclingState {
        self.recycling.state()
    }
}

impl Default for GamePlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Hsm for GamePlay {
    type Ctx = BotCtx;
    type State = PlayState;

    fn state(&self) -> PlayState {
        self.state
    }

    fn set_state(&mut self, next: PlayState) {
        self.state = next;
    }

    fn initial_state(&self) -> PlayState {
        PlayState::CollectingGarbage
    }

    fn during(&mut self, ctx: &mut BotCtx, event: Event) -> Event {
        match (self.state, event.kind) {
            (PlayState::CollectingGarbage, EventKind::Entry | EventKind::EntryHistory) => {
                let t = &ctx.tuning;
                ctx.outbox.arm(TimerId::BallCollection, t.ball_poll_ms);
                ctx.outbox.act(Action::DriveStraight {
                    speed: t.roam_speed,
                    distance_mm: t.approach_mm,
                });
                event
            }
            (PlayState::CollectingGarbage, EventKind::MoveCompleted) => {
                // Roam segment finished; wander on
                let t = &ctx.tuning;
                ctx.outbox.act(Action::DriveRotate {
                    speed: t.rotate_speed,
                    angle_deg: t.quarter_turn_deg,
                });
                Event::none()
            }
            (PlayState::CollectingGarbage, EventKind::Exit) => {
                ctx.outbox.act(Action::StopDrive);
                event
            }
            (PlayState::Recycling, EventKind::Entry) => {
                self.recycling.start(ctx, Event::entry());
                event
            }
            (PlayState::Recycling, EventKind::EntryHistory) => {
                self.recycling.start(ctx, Event::entry_history());
                event
            }
            (PlayState::Recycling, EventKind::Exit) => {
                let _ = self.recycling.run(ctx, Event::exit());
                event
            }
            (PlayState::Recycling, _) => self.recycling.run(ctx, event),
            (PlayState::Landfilling, EventKind::Entry) => {
                self.landfilling.start(ctx, Event::entry());
                event
            }
            (PlayState::Landfilling, EventKind::EntryHistory) => {
                self.landfilling.start(ctx, Event::entry_history());
                event
            }
            (PlayState::Landfilling, EventKind::Exit) => {
                let _ = self.landfilling.run(ctx, Event::exit());
                event
            }
            (PlayState::Landfilling, _) => self.landfilling.run(ctx, event),
            _ => event,
        }
    }

    fn decide(&mut self, ctx: &mut BotCtx, event: Event) -> Transition<PlayState> {
        match (self.state, event.kind) {
            (PlayState::CollectingGarbage, EventKind::Timeout)
                if event.is_timeout(TimerId::BallCollection) =>
            {
                if ctx.balls.recycle_count() > 0 {
                    Transition::to(PlayState::Recycling)
                } else if ctx.balls.landfill_count() > 0 {
                    Transition::to(PlayState::Landfilling)
                } else {
                    // Nothing stored: self-transition to restart the poll
                    Transition::to(PlayState::CollectingGarbage)
                }
            }
            (PlayState::Recycling, EventKind::RecyclingDone) => {
                Transition::to_visible(PlayState::CollectingGarbage)
            }
            (PlayState::Landfilling, EventKind::LandfillingDone) => {
                Transition::to_visible(PlayState::CollectingGarbage)
            }
            _ => Transition::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Door;
    use crate::timer::Service;

    fn setup() -> (GamePlay, BotCtx) {
        let mut sm = GamePlay::new();
        let mut ctx = BotCtx::default();
        sm.start(&mut ctx, Event::entry());
        ctx.outbox.clear();
        (sm, ctx)
    }

    #[test]
    fn test_poll_with_no_balls_restarts_timer() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::timeout(TimerId::BallCollection));
        assert_eq!(sm.state(), PlayState::CollectingGarbage);
        // Self-transition re-armed the poll timer via the Entry handler
        assert!(ctx.outbox.actions().iter().any(|a| matches!(
            a,
            Action::ArmTimer {
                id: TimerId::BallCollection,
                ..
            }
        )));
    }

    #[test]
    fn test_poll_routes_to_recycling_first() {
        let (mut sm, mut ctx) = setup();
        ctx.balls.add_recycle();
        ctx.balls.add_landfill();

        sm.run(&mut ctx, Event::timeout(TimerId::BallCollection));
        assert_eq!(sm.state(), PlayState::Recycling);
    }

    #[test]
    fn test_poll_routes_to_landfilling() {
        let (mut sm, mut ctx) = setup();
        ctx.balls.add_landfill();

        sm.run(&mut ctx, Event::timeout(TimerId::BallCollection));
        assert_eq!(sm.state(), PlayState::Landfilling);
    }

    #[test]
    fn test_completion_returns_to_collecting_and_bubbles() {
        let (mut sm, mut ctx) = setup();
        ctx.balls.add_recycle();
        sm.run(&mut ctx, Event::timeout(TimerId::BallCollection));

        // Drive the recycling run to completion
        sm.run(&mut ctx, Event::of(EventKind::BeaconAligned));
        sm.run(&mut ctx, Event::with(EventKind::BumperHit, 0));
        sm.run(
            &mut ctx,
            Event::with(EventKind::DumpDone, Door::Recycle.code()),
        );
        let out = sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));

        assert_eq!(sm.state(), PlayState::CollectingGarbage);
        // Bubbled upward for Master-level observers
        assert_eq!(out.kind, EventKind::RecyclingDone);
    }

    #[test]
    fn test_bumper_bubbles_while_collecting() {
        let (mut sm, mut ctx) = setup();
        let out = sm.run(&mut ctx, Event::with(EventKind::BumperHit, 1));
        assert_eq!(out.kind, EventKind::BumperHit);
        assert_eq!(sm.state(), PlayState::CollectingGarbage);
    }

    #[test]
    fn test_dump_request_posted_through_hierarchy() {
        let (mut sm, mut ctx) = setup();
        ctx.balls.add_recycle();
        sm.run(&mut ctx, Event::timeout(TimerId::BallCollection));
        sm.run(&mut ctx, Event::of(EventKind::BeaconAligned));
        ctx.outbox.clear();

        sm.run(&mut ctx, Event::with(EventKind::BumperHit, 0));
        let posted = ctx.outbox.pop_post_for(Service::Master).unwrap();
        assert_eq!(posted.kind, EventKind::DumpRequested);
    }
}
