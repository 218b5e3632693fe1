//! Side-effect commands emitted by state machines
//!
//! Machines never touch hardware. Entry and during handlers push `Action`s
//! into the shared [`Outbox`]; the firmware drains the queue after every
//! dispatch and applies each command to the collaborator peripherals
//! (doors, servos, drive base, interrupt sources, timer bank).
//!
//! Cross-machine signaling works the same way: a machine posts an event
//! toward a named service instead of holding a reference to it.

use heapless::Vec;

use crate::event::Event;
use crate::timer::{Service, TimerId};

/// Maximum actions buffered per dispatch
pub const MAX_ACTIONS: usize = 16;

/// Maximum cross-service posts buffered per dispatch
pub const MAX_POSTS: usize = 8;

/// Storage bin doors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Door {
    Recycle,
    Landfill,
}

impl Door {
    /// Event-parameter encoding for `DumpRequested`/`DumpDone`
    pub const fn code(self) -> u16 {
        match self {
            Door::Recycle => 0,
            Door::Landfill => 1,
        }
    }

    pub const fn from_code(code: u16) -> Self {
        match code {
            0 => Door::Recycle,
            _ => Door::Landfill,
        }
    }
}

/// Servo channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Servo {
    /// Ball sort gate (center / recycle side / landfill side)
    SortGate,
}

/// Interrupt sources the behavior layer gates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqSource {
    /// Beacon IR period capture
    Beacon,
    /// Intake ball beam
    BallBeam,
}

/// A collaborator primitive operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    OpenDoor(Door),
    CloseDoor(Door),
    /// Position a servo; percent is -100..=100 of travel from center
    SetDuty { servo: Servo, percent: i8 },
    /// Closed-loop straight move; distance is signed millimeters
    DriveStraight { speed: u8, distance_mm: i16 },
    /// Closed-loop rotation in place; angle is signed degrees
    DriveRotate { speed: u8, angle_deg: i16 },
    StopDrive,
    EnableIrq(IrqSource),
    DisableIrq(IrqSource),
    /// Status LED
    SetLed(bool),
    /// Arm (or re-arm, cancelling the prior deadline) a timer slot
    ArmTimer { id: TimerId, ms: u16 },
}

/// An event addressed to a named service's mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Post {
    pub to: Service,
    pub event: Event,
}

/// Bounded side-effect queues filled during one dispatch
#[derive(Debug, Default)]
pub struct Outbox {
    actions: Vec<Action, MAX_ACTIONS>,
    posts: Vec<Post, MAX_POSTS>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a collaborator command. Overflow drops the command; the
    /// queues are sized for the deepest entry cascade in the hierarchy.
    pub fn act(&mut self, action: Action) {
        let _ = self.actions.push(action);
    }

    /// Shorthand for arming a timer slot
    pub fn arm(&mut self, id: TimerId, ms: u16) {
        self.act(Action::ArmTimer { id, ms });
    }

    /// Queue an event for another service's mailbox
    pub fn post(&mut self, to: Service, event: Event) {
        let _ = self.posts.push(Post { to, event });
    }

    /// Drain queued actions in FIFO order
    pub fn take_actions(&mut self) -> impl Iterator<Item = Action> {
        core::mem::take(&mut self.actions).into_iter()
    }

    /// Drain queued posts in FIFO order
    pub fn take_posts(&mut self) -> impl Iterator<Item = Post> {
        core::mem::take(&mut self.posts).into_iter()
    }

    /// Remove and return the oldest post addressed to `service`
    pub fn pop_post_for(&mut self, service: Service) -> Option<Event> {
        let idx = self.posts.iter().position(|p| p.to == service)?;
        Some(self.posts.remove(idx).event)
    }

    /// Number of pending actions (test hook)
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Pending actions without draining (test hook)
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Pending posts without draining (test hook)
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.posts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    #[test]
    fn test_fifo_order() {
        let mut outbox = Outbox::new();
        outbox.act(Action::StopDrive);
        outbox.arm(TimerId::Dump, 500);

        let drained: Vec<Action, 4> = outbox.take_actions().collect();
        assert_eq!(drained[0], Action::StopDrive);
        assert_eq!(
            drained[1],
            Action::ArmTimer {
                id: TimerId::Dump,
                ms: 500
            }
        );
        assert_eq!(outbox.action_count(), 0);
    }

    #[test]
    fn test_posts_addressed() {
        let mut outbox = Outbox::new();
        outbox.post(Service::Master, Event::of(EventKind::DumpDone));

        let posts: Vec<Post, 2> = outbox.take_posts().collect();
        assert_eq!(posts[0].to, Service::Master);
        assert_eq!(posts[0].event.kind, EventKind::DumpDone);
    }
}
