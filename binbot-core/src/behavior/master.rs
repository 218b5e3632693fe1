//! Master: the top of the behavior hierarchy
//!
//! Waits for the match to start, runs GamePlay, and preempts it with
//! collision recovery on bumper contact. Returning from recovery re-enters
//! GamePlay through history so the interrupted run resumes where it left
//! off. Match end from anywhere parks the robot.

use super::{BotCtx, Collision, GamePlay};
use crate::action::{Action, Door, IrqSource};
use crate::event::{Event, EventKind};
use crate::hsm::{Hsm, Transition};
use crate::timer::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MasterState {
    WaitingForStart,
    GamePlay,
    CollisionAvoidance,
    GameEnded,
}

#[derive(Debug)]
pub struct Master {
    state: MasterState,
    game_play: GamePlay,
    collision: Collision,
    led_on: bool,
}

impl Master {
    pub fn new() -> Self {
        Self {
            state: MasterState::WaitingForStart,
            game_play: GamePlay::new(),
            collision: Collision::new(),
            led_on: false,
        }
    }

    /// GamePlay's current sub-state (test/telemetry hook)
    pub fn play_state(&self) -> super::PlayState {
        self.game_play.state()
    }

    /// Recycling run sub-state (test/telemetry hook)
    pub fn recycling_state(&self) -> super::RecyclingState {
        self.game_play.recycling_state()
    }

    fn blink(&mut self, ctx: &mut BotCtx) {
        self.led_on = !self.led_on;
        ctx.outbox.act(Action::SetLed(self.led_on));
        let period = ctx.tuning.led_blink_ms;
        ctx.outbox.arm(TimerId::LedBlink, period);
    }
}

impl Default for Master {
    fn default() -> Self {
        Self::new()
    }
}

impl Hsm for Master {
    type Ctx = BotCtx;
    type State = MasterState;

    fn state(&self) -> MasterState {
        self.state
    }

    fn set_state(&mut self, next: MasterState) {
        self.state = next;
    }

    fn initial_state(&self) -> MasterState {
        MasterState::WaitingForStart
    }

    fn during(&mut self, ctx: &mut BotCtx, event: Event) -> Event {
        match (self.state, event.kind) {
            (MasterState::WaitingForStart, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.act(Action::StopDrive);
                ctx.outbox.arm(TimerId::LedBlink, ctx.tuning.led_blink_ms);
                event
            }
            (MasterState::WaitingForStart, EventKind::Timeout)
                if event.is_timeout(TimerId::LedBlink) =>
            {
                self.blink(ctx);
                Event::none()
            }
            (MasterState::WaitingForStart, EventKind::Exit) => {
                ctx.outbox.act(Action::SetLed(true));
                event
            }
            (MasterState::GamePlay, EventKind::Entry) => {
                ctx.outbox.act(Action::EnableIrq(IrqSource::BallBeam));
                self.game_play.start(ctx, Event::entry());
                event
            }
            (MasterState::GamePlay, EventKind::EntryHistory) => {
                ctx.outbox.act(Action::EnableIrq(IrqSource::BallBeam));
                self.game_play.start(ctx, Event::entry_history());
                event
            }
            (MasterState::GamePlay, EventKind::Exit) => {
                let _ = self.game_play.run(ctx, Event::exit());
                ctx.outbox.act(Action::DisableIrq(IrqSource::BallBeam));
                event
            }
            (MasterState::GamePlay, _) => self.game_play.run(ctx, event),
            (MasterState::CollisionAvoidance, EventKind::Entry) => {
                self.collision.start(ctx, Event::entry());
                event
            }
            (MasterState::CollisionAvoidance, EventKind::Exit) => {
                let _ = self.collision.run(ctx, Event::exit());
                event
            }
            (MasterState::CollisionAvoidance, _) => self.collision.run(ctx, event),
            (MasterState::GameEnded, EventKind::Entry) => {
                ctx.outbox.act(Action::StopDrive);
                ctx.outbox.act(Action::CloseDoor(Door::Recycle));
                ctx.outbox.act(Action::CloseDoor(Door::Landfill));
                ctx.outbox.act(Action::DisableIrq(IrqSource::Beacon));
                ctx.outbox.act(Action::DisableIrq(IrqSource::BallBeam));
                ctx.outbox.arm(TimerId::LedBlink, ctx.tuning.led_blink_ms);
                event
            }
            (MasterState::GameEnded, EventKind::Timeout)
                if event.is_timeout(TimerId::LedBlink) =>
            {
                self.blink(ctx);
                Event::none()
            }
            _ => event,
        }
    }

    fn decide(&mut self, _ctx: &mut BotCtx, event: Event) -> Transition<MasterState> {
        match (self.state, event.kind) {
            (MasterState::WaitingForStart, EventKind::MatchStarted) => {
                // Fresh entry: a new match never resumes old sub-state
                Transition::to(MasterState::GamePlay)
            }
            (MasterState::GamePlay, EventKind::BumperHit) => {
                Transition::to(MasterState::CollisionAvoidance)
            }
            (MasterState::CollisionAvoidance, EventKind::MovedBack) => {
                // Resume the interrupted run
                Transition::to_history(MasterState::GamePlay)
            }
            (_, EventKind::MatchEnded) => Transition::to(MasterState::GameEnded),
            _ => Transition::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::{PlayState, RecyclingState};
    use crate::timer::Service;

    fn setup() -> (Master, BotCtx) {
        let mut sm = Master::new();
        let mut ctx = BotCtx::default();
        sm.start(&mut ctx, Event::entry());
        ctx.outbox.clear();
        (sm, ctx)
    }

    fn enter_recycling(sm: &mut Master, ctx: &mut BotCtx) {
        sm.run(ctx, Event::of(EventKind::MatchStarted));
        ctx.balls.add_recycle();
        sm.run(ctx, Event::timeout(TimerId::BallCollection));
        assert_eq!(sm.play_state(), PlayState::Recycling);
        // Past the beacon search, mid-approach
        sm.run(ctx, Event::of(EventKind::BeaconAligned));
        assert_eq!(sm.recycling_state(), RecyclingState::Approaching);
    }

    #[test]
    fn test_match_start_enters_gameplay_fresh() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::of(EventKind::MatchStarted));
        assert_eq!(sm.state(), MasterState::GamePlay);
        assert_eq!(sm.play_state(), PlayState::CollectingGarbage);
    }

    #[test]
    fn test_bumper_preempts_and_history_resumes() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::of(EventKind::MatchStarted));
        ctx.balls.add_landfill();
        sm.run(&mut ctx, Event::timeout(TimerId::BallCollection));
        assert_eq!(sm.play_state(), PlayState::Landfilling);

        // Collecting-phase bumper hit bubbles up and preempts GamePlay...
        // but in Landfilling/Approaching the hit is the dump trigger, so
        // push the run back to a state where the bumper means collision:
        // locating consumes nothing, so hit it there.
        sm.run(&mut ctx, Event::with(EventKind::BumperHit, 1));
        assert_eq!(sm.state(), MasterState::CollisionAvoidance);

        // Recovery completes; GamePlay resumes via history
        sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        assert_eq!(sm.state(), MasterState::GamePlay);
        assert_eq!(sm.play_state(), PlayState::Landfilling);
    }

    #[test]
    fn test_history_preserves_recycling_substate() {
        let (mut sm, mut ctx) = setup();
        enter_recycling(&mut sm, &mut ctx);

        // A hit during the beacon search phase would bubble; force one by
        // rewinding to Locating is not possible, so take the hit in
        // Approaching via a second machine path: MoveCompleted ends the
        // approach first, then the Dumping state ignores bumpers and a
        // hit bubbles to Master.
        sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        assert_eq!(sm.recycling_state(), RecyclingState::Dumping);

        sm.run(&mut ctx, Event::with(EventKind::BumperHit, 3));
        assert_eq!(sm.state(), MasterState::CollisionAvoidance);

        for _ in 0..3 {
            sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        }
        assert_eq!(sm.state(), MasterState::GamePlay);
        assert_eq!(sm.play_state(), PlayState::Recycling);
        assert_eq!(sm.recycling_state(), RecyclingState::Dumping);
    }

    #[test]
    fn test_match_end_from_gameplay() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::of(EventKind::MatchStarted));
        sm.run(&mut ctx, Event::of(EventKind::MatchEnded));
        assert_eq!(sm.state(), MasterState::GameEnded);
        assert!(ctx
            .outbox
            .actions()
            .iter()
            .any(|a| matches!(a, Action::StopDrive)));
    }

    #[test]
    fn test_match_end_from_collision() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::of(EventKind::MatchStarted));
        // Bumper during collecting
        sm.run(&mut ctx, Event::with(EventKind::BumperHit, 0));
        assert_eq!(sm.state(), MasterState::CollisionAvoidance);

        sm.run(&mut ctx, Event::of(EventKind::MatchEnded));
        assert_eq!(sm.state(), MasterState::GameEnded);
    }

    #[test]
    fn test_dump_completion_visible_at_master() {
        let (mut sm, mut ctx) = setup();
        enter_recycling(&mut sm, &mut ctx);

        sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));
        let _ = ctx.outbox.pop_post_for(Service::Master); // the dump request
        sm.run(
            &mut ctx,
            Event::with(EventKind::DumpDone, Door::Recycle.code()),
        );
        let out = sm.run(&mut ctx, Event::of(EventKind::MoveCompleted));

        // RecyclingDone bubbled through GamePlay all the way out
        assert_eq!(out.kind, EventKind::RecyclingDone);
        assert_eq!(sm.play_state(), PlayState::CollectingGarbage);
    }

    #[test]
    fn test_waiting_ignores_game_events() {
        let (mut sm, mut ctx) = setup();
        sm.run(&mut ctx, Event::with(EventKind::BumperHit, 0));
        sm.run(&mut ctx, Event::of(EventKind::BeaconAligned));
        assert_eq!(sm.state(), MasterState::WaitingForStart);
    }
}
