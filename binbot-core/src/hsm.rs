//! Hierarchical state machine dispatch
//!
//! Every behavioral region implements [`Hsm`]: a closed state enum, a
//! per-state `during` handler and a per-state transition table. The
//! provided [`Hsm::run`] driver owns the transition mechanics so the
//! Exit -> Entry cycle, history entry and event bubbling behave the same
//! way in every machine.
//!
//! Nesting works through `during`: a state that owns a child machine
//! starts it on `Entry`, exits it on `Exit`, and otherwise delegates the
//! event to the child's `run` and returns whatever comes back. A child
//! can therefore remap or consume an event before the parent's table
//! sees it.

use crate::event::{Event, EventKind};

/// How a target state is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryMode {
    /// Reset nested machines to their initial state
    Fresh,
    /// Resume nested machines at their last recorded state
    History,
}

/// Outcome of a transition table lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// Remain in the current state
    Stay,
    /// Move to `next`. `consume: false` re-exposes the triggering event
    /// to the enclosing machine after the transition completes.
    To {
        next: S,
        entry: EntryMode,
        consume: bool,
    },
}

impl<S> Transition<S> {
    /// Ordinary consuming transition with fresh entry
    pub const fn to(next: S) -> Self {
        Transition::To {
            next,
            entry: EntryMode::Fresh,
            consume: true,
        }
    }

    /// Consuming transition entering the target at its recorded history
    pub const fn to_history(next: S) -> Self {
        Transition::To {
            next,
            entry: EntryMode::History,
            consume: true,
        }
    }

    /// Transition that leaves the triggering event visible one level up
    pub const fn to_visible(next: S) -> Self {
        Transition::To {
            next,
            entry: EntryMode::Fresh,
            consume: false,
        }
    }
}

/// The dispatch contract every state machine implements
pub trait Hsm {
    /// Context threaded through dispatch (side-effect outbox, shared data)
    type Ctx;
    /// Closed state enumeration for this machine
    type State: Copy + PartialEq;

    fn state(&self) -> Self::State;
    fn set_state(&mut self, next: Self::State);
    fn initial_state(&self) -> Self::State;

    /// Per-state handler
    ///
    /// On `Entry`/`EntryHistory`: perform entry effects (arm timers, start
    /// a nested child) and return the event, or `Event::none()` to fully
    /// consume it. On `Exit`: run the nested child's exit first, then local
    /// cleanup. Otherwise: optionally delegate to the child and return
    /// whatever should reach this machine's transition table.
    fn during(&mut self, ctx: &mut Self::Ctx, event: Event) -> Event;

    /// Per-state transition table over `(state, kind, param)`
    fn decide(&mut self, ctx: &mut Self::Ctx, event: Event) -> Transition<Self::State>;

    /// Dispatch one event; at most one transition occurs
    ///
    /// Lifecycle pseudo-events never reach the transition table, so an
    /// `Entry` or `Exit` handler can never itself cause a transition.
    /// Self-transitions execute the full Exit -> Entry cycle, which is how
    /// states restart their own timers.
    fn run(&mut self, ctx: &mut Self::Ctx, event: Event) -> Event {
        let ev = self.during(ctx, event);
        if ev.is_none() || ev.kind.is_lifecycle() {
            return ev;
        }

        match self.decide(ctx, ev) {
            Transition::Stay => ev,
            Transition::To {
                next,
                entry,
                consume,
            } => {
                let _ = self.run(ctx, Event::exit());
                self.set_state(next);
                let enter = match entry {
                    EntryMode::Fresh => Event::entry(),
                    EntryMode::History => Event::entry_history(),
                };
                let _ = self.run(ctx, enter);
                if consume {
                    Event::none()
                } else {
                    ev
                }
            }
        }
    }

    /// Begin (or resume) this machine
    ///
    /// `EntryHistory` keeps the recorded state; anything else resets to
    /// the initial state. Entry effects fire either way.
    fn start(&mut self, ctx: &mut Self::Ctx, event: Event) {
        if event.kind != EventKind::EntryHistory {
            let initial = self.initial_state();
            self.set_state(initial);
        }
        let _ = self.run(ctx, event);
    }
}
