//! Hardware driver implementations
//!
//! This crate provides the device-facing halves of the seams defined in
//! binbot-core:
//!
//! - Drive base control (fixed-point PID cascade, move tracking,
//!   H-bridge PWM outputs)
//! - Color sensor plumbing (TCS3472 step sequences, the bus sequencer
//!   state machine, window classification)

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod color;
pub mod drive;
