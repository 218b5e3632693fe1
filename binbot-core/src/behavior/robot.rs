//! Robot: event router for the Master-service machines
//!
//! One Robot instance owns the Master hierarchy, the ball sorter, and the
//! door machine, plus the shared context they all dispatch against. The
//! firmware feeds it every event addressed to the Master service; the
//! router picks the receiving machine and then pumps any posts the
//! dispatch produced so request/reply chains (dump request, dump done)
//! resolve within the same pass.

use super::{BallDumping, BotCtx, Master, MasterState, MatchInfo};
use crate::action::Action;
use crate::behavior::BallProcessing;
use crate::config::BehaviorTuning;
use crate::event::{Event, EventKind};
use crate::hsm::Hsm;
use crate::timer::{Service, TimerId};

/// Bound on post-pump iterations per dispatch. The longest real chain is
/// DumpRequested -> DumpDone -> (completion bubbling), length three.
const PUMP_BUDGET: usize = 8;

#[derive(Debug)]
pub struct Robot {
    master: Master,
    processing: BallProcessing,
    dumping: BallDumping,
    ctx: BotCtx,
}

impl Robot {
    pub fn new(tuning: BehaviorTuning) -> Self {
        Self {
            master: Master::new(),
            processing: BallProcessing::new(),
            dumping: BallDumping::new(),
            ctx: BotCtx::new(tuning),
        }
    }

    /// Start every machine at its initial state
    pub fn init(&mut self) {
        self.master.start(&mut self.ctx, Event::entry());
        self.processing.start(&mut self.ctx, Event::entry());
        self.dumping.start(&mut self.ctx, Event::entry());
    }

    /// Dispatch one Master-service event and resolve resulting posts
    pub fn dispatch(&mut self, event: Event) {
        self.route(event);
        for _ in 0..PUMP_BUDGET {
            match self.ctx.outbox.pop_post_for(Service::Master) {
                Some(posted) => self.route(posted),
                None => break,
            }
        }
    }

    fn route(&mut self, event: Event) {
        match event.kind {
            EventKind::BallDetected | EventKind::BallGone => {
                let _ = self.processing.run(&mut self.ctx, event);
            }
            EventKind::DumpRequested => {
                let _ = self.dumping.run(&mut self.ctx, event);
            }
            EventKind::Timeout => match TimerId::from_param(event.param) {
                Some(TimerId::Processing) => {
                    let _ = self.processing.run(&mut self.ctx, event);
                }
                Some(TimerId::Dump) => {
                    let _ = self.dumping.run(&mut self.ctx, event);
                }
                _ => {
                    let _ = self.master.run(&mut self.ctx, event);
                }
            },
            _ => {
                let _ = self.master.run(&mut self.ctx, event);
            }
        }
    }

    /// Drain commands produced by the last dispatch
    pub fn take_actions(&mut self) -> impl Iterator<Item = Action> + '_ {
        self.ctx.outbox.take_actions()
    }

    /// Update the cached match facts from the referee link
    pub fn set_match_info(&mut self, info: MatchInfo) {
        self.ctx.match_info = info;
    }

    pub fn match_info(&self) -> MatchInfo {
        self.ctx.match_info
    }

    pub fn master_state(&self) -> MasterState {
        self.master.state()
    }

    #[cfg(test)]
    fn ctx_mut(&mut self) -> &mut BotCtx {
        &mut self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Door;
    use crate::behavior::{PlayState, RecyclingState};
    use crate::color::BallColor;

    fn started_robot() -> Robot {
        let mut robot = Robot::new(BehaviorTuning::default());
        robot.init();
        robot.set_match_info(MatchInfo {
            assigned_color: BallColor::Green,
            beacon_period_us: 600,
            target_station: 1,
        });
        robot.dispatch(Event::of(EventKind::MatchStarted));
        let _ = robot.take_actions().count();
        robot
    }

    #[test]
    fn test_ball_events_reach_sorter() {
        let mut robot = started_robot();
        robot.dispatch(Event::with(EventKind::BallDetected, BallColor::Green.code()));
        robot.dispatch(Event::timeout(TimerId::Processing));
        robot.dispatch(Event::of(EventKind::BallGone));
        assert_eq!(robot.ctx_mut().balls.recycle_count(), 1);
        // The Master hierarchy stayed in its collecting state
        assert_eq!(robot.master_state(), MasterState::GamePlay);
    }

    #[test]
    fn test_dump_chain_resolves_in_one_pass() {
        let mut robot = started_robot();
        robot.dispatch(Event::with(EventKind::BallDetected, BallColor::Green.code()));
        robot.dispatch(Event::timeout(TimerId::Processing));
        robot.dispatch(Event::of(EventKind::BallGone));

        // Collection poll routes GamePlay into the recycling run
        robot.dispatch(Event::timeout(TimerId::BallCollection));
        robot.dispatch(Event::of(EventKind::BeaconAligned));
        // Station contact: the recycling run posts DumpRequested, the pump
        // hands it to BallDumping in the same dispatch
        robot.dispatch(Event::with(EventKind::BumperHit, 0));
        let opened = robot
            .take_actions()
            .any(|a| matches!(a, Action::OpenDoor(Door::Recycle)));
        assert!(opened);

        // Door timer closes the cycle; DumpDone pumps back to Master and
        // the recycling run starts backing up
        robot.dispatch(Event::timeout(TimerId::Dump));
        assert_eq!(robot.ctx_mut().balls.recycle_count(), 0);
        let backing = robot
            .take_actions()
            .any(|a| matches!(a, Action::DriveStraight { distance_mm, .. } if distance_mm < 0));
        assert!(backing);

        robot.dispatch(Event::of(EventKind::MoveCompleted));
        assert_eq!(robot.master_state(), MasterState::GamePlay);
    }

    #[test]
    fn test_collision_preemption_and_resume() {
        let mut robot = started_robot();
        robot.ctx_mut().balls.add_recycle();
        robot.dispatch(Event::timeout(TimerId::BallCollection));
        robot.dispatch(Event::of(EventKind::BeaconAligned));
        robot.dispatch(Event::of(EventKind::MoveCompleted));
        // In the dumping wait a bumper hit is a real collision
        robot.dispatch(Event::with(EventKind::BumperHit, 2));
        assert_eq!(robot.master_state(), MasterState::CollisionAvoidance);

        for _ in 0..3 {
            robot.dispatch(Event::of(EventKind::MoveCompleted));
        }
        assert_eq!(robot.master_state(), MasterState::GamePlay);
    }

    #[test]
    fn test_match_end_parks() {
        let mut robot = started_robot();
        robot.dispatch(Event::of(EventKind::MatchEnded));
        assert_eq!(robot.master_state(), MasterState::GameEnded);
        let stopped = robot
            .take_actions()
            .any(|a| matches!(a, Action::StopDrive));
        assert!(stopped);
    }
}
