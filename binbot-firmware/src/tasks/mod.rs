//! Embassy async tasks
//!
//! Each task owns one service's machine and its peripherals and
//! communicates via channels/signals.

pub mod color;
pub mod drive;
pub mod inputs;
pub mod orchestrator;
pub mod referee;
pub mod timers;

pub use color::color_task;
pub use drive::{drive_task, encoder_task};
pub use inputs::{ball_beam_task, beacon_task, bumper_task};
pub use orchestrator::orchestrator_task;
pub use referee::{referee_rx_task, referee_task};
pub use timers::timer_bank_task;
