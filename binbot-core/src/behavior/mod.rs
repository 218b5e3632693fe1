//! The robot's behavioral program
//!
//! A tree of state machines built on the [`crate::hsm`] dispatch pattern:
//!
//! ```text
//! Master ── GamePlay ── { Collecting | Recycling | Landfilling }
//!    └──── CollisionAvoidance
//! BallProcessing   (flat, fed by the color sensor)
//! BallDumping      (flat, fed by dump requests)
//! ```
//!
//! Parents own children by value; children never reference parents. The
//! only cross-tree signaling is message passing through the outbox
//! (BallDumping posting `DumpDone` toward Master).

mod ball_dumping;
mod ball_processing;
mod collision;
mod game_play;
mod landfilling;
mod master;
mod recycling;
mod robot;

pub use ball_dumping::{BallDumping, DumpState};
pub use ball_processing::{BallProcessing, SortState};
pub use collision::{Collision, CollisionState};
pub use game_play::{GamePlay, PlayState};
pub use landfilling::{Landfilling, LandfillingState};
pub use master::{Master, MasterState};
pub use recycling::{Recycling, RecyclingState};
pub use robot::Robot;

use crate::action::Outbox;
use crate::color::BallColor;
use crate::config::BehaviorTuning;

/// Stored-ball counts, kept by BallProcessing and polled by GamePlay
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BallLedger {
    recycle: u8,
    landfill: u8,
}

impl BallLedger {
    pub fn recycle_count(&self) -> u8 {
        self.recycle
    }

    pub fn landfill_count(&self) -> u8 {
        self.landfill
    }

    pub fn add_recycle(&mut self) {
        self.recycle = self.recycle.saturating_add(1);
    }

    pub fn add_landfill(&mut self) {
        self.landfill = self.landfill.saturating_add(1);
    }

    pub fn clear_recycle(&mut self) {
        self.recycle = 0;
    }

    pub fn clear_landfill(&mut self) {
        self.landfill = 0;
    }
}

/// Match facts cached from the referee link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatchInfo {
    /// Color we are assigned to recycle
    pub assigned_color: BallColor,
    /// IR period of our recycling beacon (microseconds)
    pub beacon_period_us: u16,
    /// Station currently accepting our color
    pub target_station: u8,
}

impl Default for MatchInfo {
    fn default() -> Self {
        Self {
            assigned_color: BallColor::Unknown,
            beacon_period_us: 0,
            target_station: 0,
        }
    }
}

/// Context threaded through every behavior machine dispatch
#[derive(Debug, Default)]
pub struct BotCtx {
    pub outbox: Outbox,
    pub balls: BallLedger,
    pub match_info: MatchInfo,
    pub tuning: BehaviorTuning,
}

impl BotCtx {
    pub fn new(tuning: BehaviorTuning) -> Self {
        Self {
            outbox: Outbox::new(),
            balls: BallLedger::default(),
            match_info: MatchInfo::default(),
            tuning,
        }
    }
}
