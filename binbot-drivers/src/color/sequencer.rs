//! Table-driven bus sequencer
//!
//! Executes the step tables in [`super::sequence`] against a [`BusPort`].
//! Consecutive non-suspending steps run back to back inside one dispatch;
//! a `Busy` step parks the machine until the per-pass `BusCheck` poll sees
//! the bus go quiet, and a `Time` step parks it behind the settle timer.
//!
//! A `SequenceStart` arriving mid-sequence is deferred into a small FIFO
//! and recalled when the machine returns to Idle, so callers never have to
//! coordinate with each other. A bus error aborts the active sequence and
//! surfaces an `Error` event to the caller; deferred starts still run.

use binbot_core::color::ChannelReadings;
use binbot_core::event::{Event, EventKind};
use binbot_core::hsm::{Hsm, Transition};
use binbot_core::timer::{Service, TimerId};
use binbot_core::traits::BusPort;
use heapless::Deque;

use super::sequence::{Channel, SequenceId, StepOp, SuspendMode};

/// Settle delay for `Time` suspends (covers the TCS3472 2.4ms PON wait)
const SETTLE_MS: u16 = 3;

/// Deferred-start FIFO depth
const DEFER_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SeqState {
    Idle,
    Interpreting,
    Waiting4Busy,
    Waiting4Time,
}

/// Context threaded through sequencer dispatches
#[derive(Debug, Default)]
pub struct SeqCtx {
    pub outbox: binbot_core::action::Outbox,
    pub readings: ChannelReadings,
}

pub struct Sequencer<B> {
    bus: B,
    state: SeqState,
    active: Option<SequenceId>,
    pc: usize,
    deferred: Deque<u16, DEFER_DEPTH>,
    last_byte: u8,
    low: u8,
    awaiting_byte: bool,
}

impl<B: BusPort> Sequencer<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            state: SeqState::Idle,
            active: None,
            pc: 0,
            deferred: Deque::new(),
            last_byte: 0,
            low: 0,
            awaiting_byte: false,
        }
    }

    /// Access the bus port
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Execute steps starting at the program counter until one suspends,
    /// fails, or ends the table. Returns the event describing why we
    /// stopped.
    fn interpret(&mut self, ctx: &mut SeqCtx) -> Event {
        let Some(id) = self.active else {
            return Event::none();
        };
        let steps = id.steps();

        loop {
            let Some(s) = steps.get(self.pc) else {
                // Malformed table without an End marker
                self.active = None;
                return Event::with(EventKind::SequenceDone, id as u16);
            };
            self.pc += 1;

            let result = match s.op {
                StepOp::WriteCommand(value) => self.bus.write_command(value),
                StepOp::WriteByte(value) => self.bus.write_byte(value),
                StepOp::ReadByte(reg) => {
                    self.awaiting_byte = true;
                    self.bus.start_read(reg)
                }
                StepOp::StoreLow => {
                    self.low = self.last_byte;
                    Ok(())
                }
                StepOp::StoreHigh(channel) => {
                    let word = ((self.last_byte as u16) << 8) | self.low as u16;
                    match channel {
                        Channel::Clear => ctx.readings.clear = word,
                        Channel::Red => ctx.readings.red = word,
                        Channel::Green => ctx.readings.green = word,
                        Channel::Blue => ctx.readings.blue = word,
                    }
                    Ok(())
                }
                StepOp::End => {
                    self.active = None;
                    return Event::with(EventKind::SequenceDone, id as u16);
                }
            };

            if result.is_err() {
                self.active = None;
                return Event::of(EventKind::Error);
            }

            match s.suspend {
                SuspendMode::None => continue,
                SuspendMode::Busy => return Event::of(EventKind::BusyWait),
                SuspendMode::Time => return Event::of(EventKind::TimeWait),
            }
        }
    }
}

impl<B: BusPort> Hsm for Sequencer<B> {
    type Ctx = SeqCtx;
    type State = SeqState;

    fn state(&self) -> SeqState {
        self.state
    }

    fn set_state(&mut self, next: SeqState) {
        self.state = next;
    }

    fn initial_state(&self) -> SeqState {
        SeqState::Idle
    }

    fn during(&mut self, ctx: &mut SeqCtx, event: Event) -> Event {
        match (self.state, event.kind) {
            (SeqState::Idle, EventKind::Entry | EventKind::EntryHistory) => {
                // Recall the oldest deferred start
                if let Some(param) = self.deferred.pop_front() {
                    ctx.outbox.post(
                        Service::ColorSensor,
                        Event::with(EventKind::SequenceStart, param),
                    );
                }
                event
            }
            (SeqState::Idle, EventKind::SequenceStart) => {
                match SequenceId::from_param(event.param) {
                    Some(id) => {
                        self.active = Some(id);
                        self.pc = 0;
                        event
                    }
                    None => Event::none(),
                }
            }
            (_, EventKind::SequenceStart) => {
                // Busy with another table; queue for recall at Idle
                let _ = self.deferred.push_back(event.param);
                Event::none()
            }
            (SeqState::Interpreting, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox
                    .post(Service::ColorSensor, Event::of(EventKind::SequenceStep));
                event
            }
            (SeqState::Interpreting, EventKind::SequenceStep) => self.interpret(ctx),
            (SeqState::Waiting4Busy, EventKind::BusCheck) => {
                let status = self.bus.status();
                if status.error {
                    self.active = None;
                    self.awaiting_byte = false;
                    Event::of(EventKind::Error)
                } else if status.busy {
                    Event::none()
                } else {
                    if self.awaiting_byte {
                        self.last_byte = self.bus.take_byte();
                        self.awaiting_byte = false;
                    }
                    Event::of(EventKind::SequenceStep)
                }
            }
            (SeqState::Waiting4Time, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.arm(TimerId::BusTransaction, SETTLE_MS);
                event
            }
            (SeqState::Waiting4Time, EventKind::Timeout)
                if event.is_timeout(TimerId::BusTransaction) =>
            {
                Event::of(EventKind::SequenceStep)
            }
            _ => event,
        }
    }

    fn decide(&mut self, _ctx: &mut SeqCtx, event: Event) -> Transition<SeqState> {
        match (self.state, event.kind) {
            (SeqState::Idle, EventKind::SequenceStart) => Transition::to(SeqState::Interpreting),
            (SeqState::Interpreting, EventKind::BusyWait) => Transition::to(SeqState::Waiting4Busy),
            (SeqState::Interpreting, EventKind::TimeWait) => Transition::to(SeqState::Waiting4Time),
            (SeqState::Interpreting, EventKind::SequenceDone)
            | (SeqState::Interpreting, EventKind::Error) => {
                // Completion and failure both surface to the caller
                Transition::to_visible(SeqState::Idle)
            }
            (SeqState::Waiting4Busy, EventKind::SequenceStep)
            | (SeqState::Waiting4Time, EventKind::SequenceStep) => {
                Transition::to(SeqState::Interpreting)
            }
            (SeqState::Waiting4Busy, EventKind::Error) => Transition::to_visible(SeqState::Idle),
            _ => Transition::Stay,
        }
    }
}
