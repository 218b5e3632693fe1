//! Collision recovery
//!
//! A linear three-step sequence: back away, quarter turn, move forward.
//! Each state arms a drive command on entry and advances on
//! `MoveCompleted`; the collision timer bounds each step in case the move
//! never completes (wedged against a wall). A bumper re-hit during
//! recovery is ignored rather than re-dispatched, which avoids livelock
//! when the robot is boxed in.

use super::BotCtx;
use crate::action::Action;
use crate::event::{Event, EventKind};
use crate::hsm::{Hsm, Transition};
use crate::timer::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CollisionState {
    MovingBackwards,
    QuarterTurn,
    MovingForward,
}

#[derive(Debug)]
pub struct Collision {
    state: CollisionState,
}

impl Collision {
    pub fn new() -> Self {
        Self {
            state: CollisionState::MovingBackwards,
        }
    }

    fn step_done(&self, event: &Event) -> bool {
        event.kind == EventKind::MoveCompleted || event.is_timeout(TimerId::Collision)
    }
}

impl Default for Collision {
    fn default() -> Self {
        Self::new()
    }
}

impl Hsm for Collision {
    type Ctx = BotCtx;
    type State = CollisionState;

    fn state(&self) -> CollisionState {
        self.state
    }

    fn set_state(&mut self, next: CollisionState) {
        self.state = next;
    }

    fn initial_state(&self) -> CollisionState {
        CollisionState::MovingBackwards
    }

    fn during(&mut self, ctx: &mut BotCtx, event: Event) -> Event {
        let t = &ctx.tuning;
        match (self.state, event.kind) {
            (CollisionState::MovingBackwards, EventKind::Entry) => {
                ctx.outbox.act(Action::DriveStraight {
                    speed: t.backup_speed,
                    distance_mm: t.backup_mm,
                });
                ctx.outbox.arm(TimerId::Collision, t.collision_step_ms);
                event
            }
            (CollisionState::QuarterTurn, EventKind::Entry) => {
                ctx.outbox.act(Action::DriveRotate {
                    speed: t.rotate_speed,
                    angle_deg: t.quarter_turn_deg,
                });
                ctx.outbox.arm(TimerId::Collision, t.collision_step_ms);
                event
            }
            (CollisionState::MovingForward, EventKind::Entry) => {
                ctx.outbox.act(Action::DriveStraight {
                    speed: t.backup_speed,
                    distance_mm: -t.backup_mm,
                });
                ctx.outbox.arm(TimerId::Collision, t.collision_step_ms);
                event
            }
            (_, EventKind::Exit) => {
                ctx.outbox.act(Action::StopDrive);
                event
            }
            // Re-hit while already recovering: swallow it
            (_, EventKind::BumperHit) => Event::none(),
            (CollisionState::MovingForward, _) if self.step_done(&event) => {
                // Recovery complete; announce it upward
                Event::of(EventKind::MovedBack)
            }
            _ => event,
        }
    }

    fn decide(&mut self, _ctx: &mut BotCtx, event: Event) -> Transition<CollisionState> {
        match self.state {
            CollisionState::MovingBackwards if self.step_done(&event) => {
                Transition::to(CollisionState::QuarterTurn)
            }
            CollisionState::QuarterTurn if self.step_done(&event) => {
                Transition::to(CollisionState::MovingForward)
            }
            // MovedBack stays visible so Master can resume GamePlay
            _ => Transition::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    fn setup() -> (Collision, BotCtx) {
        let mut sm = Collision::new();
        let mut ctx = BotCtx::default();
        sm.start(&mut ctx, Event::entry());
        ctx.outbox.clear();
        (sm, ctx)
    }

    #[test]
    fn test_linear_sequence() {
        let (mut sm, mut ctx) = setup();
        assert_eq!(sm.state(), CollisionState::MovingBackwards);

        sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        assert_eq!(sm.state(), CollisionState::QuarterTurn);

        sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        assert_eq!(sm.state(), CollisionState::MovingForward);

        let out = sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        assert_eq!(out.kind, EventKind::MovedBack);
    }

    #[test]
    fn test_timeout_advances_step() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::timeout(TimerId::Collision));
        assert_eq!(sm.state(), CollisionState::QuarterTurn);
    }

    #[test]
    fn test_rehit_ignored() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        let before = sm.state();

        let out = sm.run(&mut ctx, Event::with(EventKind::BumperHit, 1));
        assert!(out.is_none());
        assert_eq!(sm.state(), before);
    }

    #[test]
    fn test_entry_arms_drive_and_timer() {
        let mut sm = Collision::new();
        let mut ctx = BotCtx::default();
        sm.start(&mut ctx, Event::entry());

        let backup = ctx.tuning.backup_mm;
        let actions = ctx.outbox.actions();
        assert!(actions.iter().any(|a| matches!(
            a,
            Action::DriveStraight { distance_mm, .. } if *distance_mm == backup
        )));
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::ArmTimer { id: TimerId::Collision, .. })));
    }
}
