//! Referee link session machine
//!
//! Handshake then poll: register until the device acknowledges our team,
//! fetch the team assignment once, then cycle status and value queries
//! for the rest of the match. Polling is timer paced; each state
//! transmits its command on its timer's expiry and advances on the
//! validated reply.
//!
//! The status poll is an edge detector. Steady state is silent; only a
//! phase change synthesizes `MatchStarted`/`MatchEnded` toward the
//! behavior hierarchy, and only a change in which station accepts our
//! color posts `StationChanged`. Registration retries indefinitely with
//! no backoff (the match clock bounds it); the retry count is kept for
//! telemetry.

use binbot_core::action::Outbox;
use binbot_core::behavior::MatchInfo;
use binbot_core::color::BallColor;
use binbot_core::event::{Event, EventKind};
use binbot_core::hsm::{Hsm, Transition};
use binbot_core::timer::{Service, TimerId};
use heapless::Vec;

use crate::wire::{expected_ack, Command, MatchPhase, StatusByte, TeamInfo, FRAME_LEN};

/// Byte-poll period during handshake and value queries (ms)
const POLL_MS: u16 = 50;

/// Status refresh period once registered (ms)
const REFRESH_MS: u16 = 250;

/// Outgoing frames buffered per dispatch
const TX_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    Registering,
    QueryTeam,
    QueryStatus,
    QueryValue,
}

/// Context threaded through session dispatches
///
/// The referee task drains `tx` to the UART after every dispatch.
#[derive(Debug, Default)]
pub struct SessionCtx {
    pub outbox: Outbox,
    pub tx: Vec<[u8; FRAME_LEN], TX_DEPTH>,
}

impl SessionCtx {
    fn send(&mut self, cmd: Command) {
        let _ = self.tx.push(cmd.encode());
    }
}

pub struct Session {
    state: SessionState,
    team: u8,
    ack: u8,
    assigned_color: BallColor,
    beacon_period_us: u16,
    last_phase: Option<MatchPhase>,
    target_station: Option<u8>,
    last_value: u8,
    registration_retries: u16,
}

impl Session {
    pub fn new(team: u8) -> Self {
        Self {
            state: SessionState::Registering,
            team,
            ack: expected_ack(team),
            assigned_color: BallColor::Unknown,
            beacon_period_us: 0,
            last_phase: None,
            target_station: None,
            last_value: 0,
            registration_retries: 0,
        }
    }

    /// Current picture of the match for the behavior layer
    pub fn match_info(&self) -> MatchInfo {
        MatchInfo {
            assigned_color: self.assigned_color,
            beacon_period_us: self.beacon_period_us,
            target_station: self.target_station.unwrap_or(0),
        }
    }

    /// Failed registration attempts so far (telemetry)
    pub fn registration_retries(&self) -> u16 {
        self.registration_retries
    }

    /// Payload of the last value query
    pub fn last_value(&self) -> u8 {
        self.last_value
    }

    fn process_status(&mut self, ctx: &mut SessionCtx, status: StatusByte) {
        let phase = status.phase();
        match (self.last_phase, phase) {
            (Some(MatchPhase::WaitingForStart), MatchPhase::Active) => {
                ctx.outbox
                    .post(Service::Master, Event::of(EventKind::MatchStarted));
            }
            (Some(MatchPhase::WaitingForStart), MatchPhase::Over)
            | (Some(MatchPhase::Active), MatchPhase::Over) => {
                ctx.outbox
                    .post(Service::Master, Event::of(EventKind::MatchEnded));
            }
            _ => {}
        }
        self.last_phase = Some(phase);

        let station = status.station_for(self.assigned_color);
        if station != self.target_station {
            self.target_station = station;
            if let Some(s) = station {
                ctx.outbox.post(
                    Service::Master,
                    Event::with(EventKind::StationChanged, s as u16),
                );
            }
        }
    }
}

impl Hsm for Session {
    type Ctx = SessionCtx;
    type State = SessionState;

    fn state(&self) -> SessionState {
        self.state
    }

    fn set_state(&mut self, next: SessionState) {
        self.state = next;
    }

    fn initial_state(&self) -> SessionState {
        SessionState::Registering
    }

    fn during(&mut self, ctx: &mut SessionCtx, event: Event) -> Event {
        match (self.state, event.kind) {
            (SessionState::Registering, EventKind::Entry | EventKind::EntryHistory)
            | (SessionState::QueryTeam, EventKind::Entry | EventKind::EntryHistory)
            | (SessionState::QueryValue, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.arm(TimerId::CompassByte, POLL_MS);
                event
            }
            (SessionState::QueryStatus, EventKind::Entry | EventKind::EntryHistory) => {
                ctx.outbox.arm(TimerId::CompassRefresh, REFRESH_MS);
                event
            }
            (SessionState::Registering, EventKind::Timeout)
                if event.is_timeout(TimerId::CompassByte) =>
            {
                ctx.send(Command::Register(self.team));
                ctx.outbox.arm(TimerId::CompassByte, POLL_MS);
                Event::none()
            }
            (SessionState::Registering, EventKind::ResponseReceived) => {
                if event.param as u8 == self.ack {
                    event
                } else {
                    // Wrong ack: stay put, the next tick retransmits
                    self.registration_retries = self.registration_retries.saturating_add(1);
                    Event::none()
                }
            }
            (SessionState::QueryTeam, EventKind::Timeout)
                if event.is_timeout(TimerId::CompassByte) =>
            {
                ctx.send(Command::QueryTeam);
                ctx.outbox.arm(TimerId::CompassByte, POLL_MS);
                Event::none()
            }
            (SessionState::QueryTeam, EventKind::ResponseReceived) => {
                let info = TeamInfo(event.param as u8);
                self.assigned_color = info.assigned_color();
                self.beacon_period_us = info.beacon_period_us();
                event
            }
            (SessionState::QueryStatus, EventKind::Timeout)
                if event.is_timeout(TimerId::CompassRefresh) =>
            {
                ctx.send(Command::QueryStatus);
                ctx.outbox.arm(TimerId::CompassRefresh, REFRESH_MS);
                Event::none()
            }
            (SessionState::QueryStatus, EventKind::ResponseReceived) => {
                self.process_status(ctx, StatusByte(event.param as u8));
                event
            }
            (SessionState::QueryValue, EventKind::Timeout)
                if event.is_timeout(TimerId::CompassByte) =>
            {
                ctx.send(Command::QueryValue);
                ctx.outbox.arm(TimerId::CompassByte, POLL_MS);
                Event::none()
            }
            (SessionState::QueryValue, EventKind::ResponseReceived) => {
                self.last_value = event.param as u8;
                event
            }
            _ => event,
        }
    }

    fn decide(&mut self, _ctx: &mut SessionCtx, event: Event) -> Transition<SessionState> {
        match (self.state, event.kind) {
            (SessionState::Registering, EventKind::ResponseReceived) => {
                Transition::to(SessionState::QueryTeam)
            }
            (SessionState::QueryTeam, EventKind::ResponseReceived) => {
                Transition::to(SessionState::QueryStatus)
            }
            (SessionState::QueryStatus, EventKind::ResponseReceived) => {
                Transition::to(SessionState::QueryValue)
            }
            (SessionState::QueryValue, EventKind::ResponseReceived) => {
                Transition::to(SessionState::QueryStatus)
            }
            _ => Transition::Stay,
        }
    }
}
