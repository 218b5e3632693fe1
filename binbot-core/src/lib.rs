//! Board-agnostic control logic for the trash-sorting robot firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - The shared event type and timer slot names
//! - The hierarchical state machine dispatch pattern
//! - The behavior hierarchy (match play, delivery runs, ball handling)
//! - Side-effect command queues
//! - Drive motion primitives (tick capture, unit conversion)
//! - Hardware abstraction traits (bus port, wheel outputs)
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod action;
pub mod behavior;
pub mod color;
pub mod config;
pub mod event;
pub mod hsm;
pub mod motion;
pub mod timer;
pub mod traits;
