//! BallProcessing: classify an incoming ball and steer the sort gate
//!
//! Runs beside the Master tree, fed directly by the color sensor. A
//! detected ball is compared against the assigned match color, counted in
//! the ledger, and after a short settle delay the gate swings toward the
//! matching bin. The gate returns to neutral once the ball clears the
//! beam.

use super::BotCtx;
use crate::action::{Action, Door, Servo};
use crate::color::BallColor;
use crate::event::{Event, EventKind};
use crate::hsm::{Hsm, Transition};
use crate::timer::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SortState {
    Waiting4Ball,
    Recycle,
    Landfill,
}

#[derive(Debug)]
pub struct BallProcessing {
    state: SortState,
    pending: Option<Door>,
}

impl BallProcessing {
    pub fn new() -> Self {
        Self {
            state: SortState::Waiting4Ball,
            pending: None,
        }
    }
}

impl Default for BallProcessing {
    fn default() -> Self {
        Self::new()
    }
}

impl Hsm for BallProcessing {
    type Ctx = BotCtx;
    type State = SortState;

    fn state(&self) -> SortState {
        self.state
    }

    fn set_state(&mut self, next: SortState) {
        self.state = next;
    }

    fn initial_state(&self) -> SortState {
        SortState::Waiting4Ball
    }

    fn during(&mut self, ctx: &mut BotCtx, event: Event) -> Event {
        match (self.state, event.kind) {
            (SortState::Waiting4Ball, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::SetDuty {
                    servo: Servo::SortGate,
                    percent: 0,
                });
                event
            }
            (SortState::Waiting4Ball, EventKind::BallDetected) => {
                let color = BallColor::from_code(event.param);
                if color == ctx.match_info.assigned_color {
                    ctx.balls.add_recycle();
                    self.pending = Some(Door::Recycle);
                } else {
                    ctx.balls.add_landfill();
                    self.pending = Some(Door::Landfill);
                }
                // Let the ball settle against the gate before moving it
                ctx.outbox.arm(TimerId::Processing, ctx.tuning.sort_ms);
                Event::none()
            }
            (SortState::Recycle, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::SetDuty {
                    servo: Servo::SortGate,
                    percent: 100,
                });
                event
            }
            (SortState::Landfill, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::SetDuty {
                    servo: Servo::SortGate,
                    percent: -100,
                });
                event
            }
            (SortState::Recycle | SortState::Landfill, EventKind::Exit) => {
                ctx.outbox.act(Action::SetDuty {
                    servo: Servo::SortGate,
                    percent: 0,
                });
                event
            }
            _ => event,
        }
    }

    fn decide(&mut self, _ctx: &mut BotCtx, event: Event) -> Transition<SortState> {
        match (self.state, event.kind) {
            (SortState::Waiting4Ball, EventKind::Timeout)
                if event.is_timeout(TimerId::Processing) =>
            {
                match self.pending.take() {
                    Some(Door::Recycle) => Transition::to(SortState::Recycle),
                    Some(Door::Landfill) => Transition::to(SortState::Landfill),
                    None => Transition::Stay,
                }
            }
            (SortState::Recycle | SortState::Landfill, EventKind::BallGone) => {
                Transition::to(SortState::Waiting4Ball)
            }
            _ => Transition::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (BallProcessing, BotCtx) {
        let mut sm = BallProcessing::new();
        let mut ctx = BotCtx::default();
        ctx.match_info.assigned_color = BallColor::Red;
        sm.start(&mut ctx, Event::entry());
        ctx.outbox.clear();
        (sm, ctx)
    }

    fn gate_duty(ctx: &BotCtx) -> Option<i8> {
        ctx.outbox.actions().iter().rev().find_map(|a| match a {
            Action::SetDuty {
                servo: Servo::SortGate,
                percent,
            } => Some(*percent),
            _ => None,
        })
    }

    #[test]
    fn test_assigned_color_goes_to_recycle() {
        let (mut sm, mut ctx) = setup();

        let out = sm.run(&mut ctx, Event::with(EventKind::BallDetected, BallColor::Red.code()));
        assert!(out.is_none());
        assert_eq!(ctx.balls.recycle_count(), 1);
        assert_eq!(sm.state(), SortState::Waiting4Ball);

        sm.run(&mut ctx, Event::timeout(TimerId::Processing));
        assert_eq!(sm.state(), SortState::Recycle);
        assert_eq!(gate_duty(&ctx), Some(100));
    }

    #[test]
    fn test_other_color_goes_to_landfill() {
        let (mut sm, mut ctx) = setup();

        sm.run(&mut ctx, Event::with(EventKind::BallDetected, BallColor::Blue.code()));
        assert_eq!(ctx.balls.landfill_count(), 1);

        sm.run(&mut ctx, Event::timeout(TimerId::Processing));
        assert_eq!(sm.state(), SortState::Landfill);
        assert_eq!(gate_duty(&ctx), Some(-100));
    }

    #[test]
    fn test_unknown_color_goes_to_landfill() {
        let (mut sm, mut ctx) = setup();

        sm.run(&mut ctx, Event::with(EventKind::BallDetected, BallColor::Unknown.code()));
        sm.run(&mut ctx, Event::timeout(TimerId::Processing));
        assert_eq!(sm.state(), SortState::Landfill);
        assert_eq!(ctx.balls.landfill_count(), 1);
    }

    #[test]
    fn test_gate_neutral_after_ball_clears() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::with(EventKind::BallDetected, BallColor::Red.code()));
        sm.run(&mut ctx, Event::timeout(TimerId::Processing));
        ctx.outbox.clear();

        sm.run(&mut ctx, Event::of(EventKind::BallGone));
        assert_eq!(sm.state(), SortState::Waiting4Ball);
        assert_eq!(gate_duty(&ctx), Some(0));
    }

    #[test]
    fn test_stray_timeout_without_detection_ignored() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::timeout(TimerId::Processing));
        assert_eq!(sm.state(), SortState::Waiting4Ball);
    }

    #[test]
    fn test_counts_accumulate() {
        let (mut sm, mut ctx) = setup();
        for _ in 0..3 {
            sm.run(&mut ctx, Event::with(EventKind::BallDetected, BallColor::Red.code()));
            sm.run(&mut ctx, Event::timeout(TimerId::Processing));
            sm.run(&mut ctx, Event::of(EventKind::BallGone));
        }
        assert_eq!(ctx.balls.recycle_count(), 3);
    }
}
