//! Events routed between state machines
//!
//! Every machine in the firmware consumes the same flat event type. An
//! event is a kind plus one parameter word; the meaning of the parameter
//! depends on the kind (timer slot on `Timeout`, switch id on `BumperHit`,
//! color code on `BallDetected`).

use crate::timer::TimerId;

/// Event kinds shared by every state machine
///
/// The first eight variants are framework events: `Entry`, `EntryHistory`
/// and `Exit` are synthesized by the dispatch driver and never travel
/// through a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    /// No event; also the "consumed" marker returned by `run`
    NoEvent,
    /// Framework error notification
    Error,
    /// Service initialization
    Init,
    /// A countdown timer expired (param = timer slot)
    Timeout,
    /// Short-interval timer expired (param = timer slot)
    ShortTimeout,
    /// State entered fresh
    Entry,
    /// State entered at its last recorded sub-state
    EntryHistory,
    /// State is being left
    Exit,

    // Match events (from the referee link)
    /// Match phase edge: waiting -> active
    MatchStarted,
    /// Match phase edge: active -> over
    MatchEnded,
    /// The station currently accepting our color changed (param = station)
    StationChanged,

    // Ball handling
    /// A ball broke the intake beam and was classified (param = color code)
    BallDetected,
    /// The ball cleared the sort gate
    BallGone,
    /// A dump of a storage bin was requested (param = bin side)
    DumpRequested,
    /// A dump cycle finished (param = bin side)
    DumpDone,

    // Navigation
    /// A bumper switch closed (param = switch id)
    BumperHit,
    /// The floor tape sensor fired
    TapeDetected,
    /// The beacon detector matched the assigned period (param = station)
    BeaconAligned,
    /// The drive controller finished the commanded move
    MoveCompleted,
    /// Collision recovery finished backing away
    MovedBack,
    /// Recycling sub-hierarchy ran to completion
    RecyclingDone,
    /// Landfilling sub-hierarchy ran to completion
    LandfillingDone,

    // Bus sequencer
    /// Begin executing a named step sequence (param = sequence id)
    SequenceStart,
    /// Execute the next step of the active sequence
    SequenceStep,
    /// Suspend until the bus busy flag clears
    BusyWait,
    /// Suspend for a fixed settle delay
    TimeWait,
    /// The active sequence ran to its end marker (param = sequence id)
    SequenceDone,
    /// Per-scheduler-pass poll of the bus status flag
    BusCheck,

    // Serial link
    /// A reply payload byte arrived from the referee device (param = byte)
    ResponseReceived,
}

impl EventKind {
    /// Entry/EntryHistory/Exit are interpreted by `during` and must never
    /// reach a transition table.
    pub const fn is_lifecycle(self) -> bool {
        matches!(
            self,
            EventKind::Entry | EventKind::EntryHistory | EventKind::Exit
        )
    }
}

/// A routed event: kind plus one kind-dependent parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Event {
    pub kind: EventKind,
    pub param: u16,
}

impl Event {
    /// The consumed/absent event
    pub const fn none() -> Self {
        Self::of(EventKind::NoEvent)
    }

    /// An event with no meaningful parameter
    pub const fn of(kind: EventKind) -> Self {
        Self { kind, param: 0 }
    }

    /// An event carrying a parameter word
    pub const fn with(kind: EventKind, param: u16) -> Self {
        Self { kind, param }
    }

    /// Fresh state entry
    pub const fn entry() -> Self {
        Self::of(EventKind::Entry)
    }

    /// History state entry
    pub const fn entry_history() -> Self {
        Self::of(EventKind::EntryHistory)
    }

    /// State exit
    pub const fn exit() -> Self {
        Self::of(EventKind::Exit)
    }

    /// Timer expiry for a slot
    pub const fn timeout(id: TimerId) -> Self {
        Self::with(EventKind::Timeout, id as u16)
    }

    /// True if this is a `Timeout` for the given slot
    pub fn is_timeout(&self, id: TimerId) -> bool {
        self.kind == EventKind::Timeout && self.param == id as u16
    }

    /// True if this event has been consumed (or never existed)
    pub fn is_none(&self) -> bool {
        self.kind == EventKind::NoEvent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_predicate() {
        assert!(EventKind::Entry.is_lifecycle());
        assert!(EventKind::EntryHistory.is_lifecycle());
        assert!(EventKind::Exit.is_lifecycle());
        assert!(!EventKind::Timeout.is_lifecycle());
        assert!(!EventKind::BallDetected.is_lifecycle());
        assert!(!EventKind::NoEvent.is_lifecycle());
    }

    #[test]
    fn test_timeout_matching() {
        let ev = Event::timeout(TimerId::Dump);
        assert!(ev.is_timeout(TimerId::Dump));
        assert!(!ev.is_timeout(TimerId::Processing));
        assert!(!Event::of(EventKind::BallGone).is_timeout(TimerId::Dump));
    }

    #[test]
    fn test_none_is_consumed() {
        assert!(Event::none().is_none());
        assert!(!Event::entry().is_none());
    }
}
