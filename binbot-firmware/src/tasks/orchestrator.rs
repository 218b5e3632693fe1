//! Master orchestration task
//!
//! Owns the behavior hierarchy and the local output peripherals. Every
//! event from the Master mailbox is dispatched into the robot; the
//! actions the dispatch produced are then applied: timer arms and drive
//! commands go out over the command plumbing, interrupt gates flip their
//! atomics, and everything else lands on the board outputs directly.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::*;
use embassy_futures::select::{select, Either};
use heapless::Vec;

use binbot_core::action::{Action, IrqSource, MAX_ACTIONS};
use binbot_core::behavior::Robot;
use binbot_core::config::BehaviorTuning;
use binbot_drivers::drive::DriveCommand;

use crate::board::BoardOutputs;
use crate::channels::{
    ArmRequest, BALL_BEAM_IRQ_ENABLED, BEACON_IRQ_ENABLED, DRIVE_CMD, MASTER_EVENTS, MATCH_INFO,
    TIMER_REQUESTS,
};

#[embassy_executor::task]
pub async fn orchestrator_task(mut board: BoardOutputs) {
    info!("Orchestrator task started");

    let mut robot = Robot::new(BehaviorTuning::default());
    robot.init();
    apply_actions(&mut robot, &mut board).await;

    loop {
        match select(MASTER_EVENTS.receive(), MATCH_INFO.wait()).await {
            Either::First(event) => {
                trace!("Master event: {:?}", event);
                robot.dispatch(event);
                apply_actions(&mut robot, &mut board).await;
            }
            Either::Second(info) => {
                debug!("Match info: {:?}", info);
                robot.set_match_info(info);
            }
        }
    }
}

/// Route every action the last dispatch produced
async fn apply_actions(robot: &mut Robot, board: &mut BoardOutputs) {
    let actions: Vec<Action, MAX_ACTIONS> = robot.take_actions().collect();
    for action in actions {
        match action {
            Action::ArmTimer { id, ms } => TIMER_REQUESTS.send(ArmRequest { id, ms }).await,
            Action::DriveStraight { speed, distance_mm } => {
                DRIVE_CMD.signal(DriveCommand::Straight { speed, distance_mm });
            }
            Action::DriveRotate { speed, angle_deg } => {
                DRIVE_CMD.signal(DriveCommand::Rotate { speed, angle_deg });
            }
            Action::StopDrive => DRIVE_CMD.signal(DriveCommand::Stop),
            Action::EnableIrq(src) => gate(src).store(true, Ordering::Relaxed),
            Action::DisableIrq(src) => gate(src).store(false, Ordering::Relaxed),
            local => board.apply(local),
        }
    }
}

fn gate(src: IrqSource) -> &'static AtomicBool {
    match src {
        IrqSource::Beacon => &BEACON_IRQ_ENABLED,
        IrqSource::BallBeam => &BALL_BEAM_IRQ_ENABLED,
    }
}
