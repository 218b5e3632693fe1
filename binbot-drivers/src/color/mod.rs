//! Color sensor plumbing
//!
//! The TCS3472 hangs off a byte-oriented bus whose transactions complete
//! asynchronously. Rather than block, register access is expressed as
//! constant step tables ([`sequence`]) executed by a small state machine
//! ([`sequencer`]) that suspends on the bus busy flag or a settle timer.
//! Completed reads land in [`binbot_core::color::ChannelReadings`] and are
//! mapped to a ball color by [`classify`].

pub mod classify;
pub mod sequence;
pub mod sequencer;

pub use classify::classify;
pub use sequence::{Channel, SequenceId, Step, StepOp, SuspendMode};
pub use sequencer::{SeqCtx, SeqState, Sequencer};
