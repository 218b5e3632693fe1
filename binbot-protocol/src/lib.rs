//! Referee link protocol
//!
//! The match referee device ("compass box") hangs off a slow UART. The
//! master transmits a one-byte command padded to three bytes; the device
//! replies with three bytes of which only the third carries payload.
//!
//! ```text
//! out:  ┌─────┬──────┬──────┐      in:  ┌───────┬───────┬─────────┐
//!       │ CMD │ 0x00 │ 0x00 │           │ (pad) │ (pad) │ PAYLOAD │
//!       └─────┴──────┴──────┘           └───────┴───────┴─────────┘
//! ```
//!
//! [`wire`] covers the byte-level encoding; [`session`] is the
//! handshake-then-poll state machine that keeps the robot's picture of
//! the match current and feeds phase edges into the behavior hierarchy.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod session;
pub mod wire;

pub use session::{Session, SessionCtx, SessionState};
pub use wire::{
    expected_ack, Command, MatchPhase, StatusByte, TeamInfo, BEACON_PERIOD_US, FRAME_LEN,
    REPLY_PAYLOAD_INDEX,
};
