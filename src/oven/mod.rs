//! Oven (device) side: the authoritative microwave front-panel logic.
//!
//! [`OvenService`] owns the state machine, its context and the stream
//! decoder.  It exposes a hardware-agnostic API; all output flows through
//! the port traits handed in at each call:
//!
//! ```text
//!  bytes / frames ──▶ ┌─────────────────────────┐ ──▶ FrameSink (to panel)
//!  button events  ──▶ │       OvenService        │
//!  elapsed time   ──▶ │  HFSM · timers · outbox  │ ──▶ DisplayPort
//!                     └─────────────────────────┘
//! ```
//!
//! Each call runs to completion: the event is dispatched, any events raised
//! by actions are dispatched in order, and the outbox is flushed.

pub mod context;
pub mod states;

use heapless::Vec;
use log::{debug, info, trace};

use crate::app::ports::{DisplayPort, FrameSink};
use crate::codec::stream::StreamDecoder;
use crate::codec::{self, Code, Destination, FRAME_LEN, Frame, SignalCode, StateCode};
use crate::config::OvenConfig;
use crate::error::Result;
use crate::hfsm::{Dispatch, Hfsm, StateSet, TransitionId, Trigger};
use crate::time::{CookEntry, DigitPosition, Time};
use crate::timers::TimerId;

use context::OvenContext;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every oven state.  Must stay in sync with [`states::build_machine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OvenState {
    Oven = 0,
    DisplayClock = 1,
    ClockIdle = 2,
    SetClock = 3,
    ClockHourTens = 4,
    ClockHourOnes = 5,
    ClockMinuteTens = 6,
    ClockMinuteOnes = 7,
    SetCookTime = 8,
    CookTimeInitial = 9,
    SetPowerLevel = 10,
    SetKitchenTimer = 11,
    KitchenMinuteTens = 12,
    KitchenMinuteOnes = 13,
    KitchenSecondTens = 14,
    KitchenSecondOnes = 15,
    DisplayTimer = 16,
    TimerRunning = 17,
    TimerPaused = 18,
}

impl StateSet for OvenState {
    const COUNT: usize = 19;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Oven => "Oven",
            Self::DisplayClock => "DisplayClock",
            Self::ClockIdle => "ClockIdle",
            Self::SetClock => "SetClock",
            Self::ClockHourTens => "ClockHourTens",
            Self::ClockHourOnes => "ClockHourOnes",
            Self::ClockMinuteTens => "ClockMinuteTens",
            Self::ClockMinuteOnes => "ClockMinuteOnes",
            Self::SetCookTime => "SetCookTime",
            Self::CookTimeInitial => "CookTimeInitial",
            Self::SetPowerLevel => "SetPowerLevel",
            Self::SetKitchenTimer => "SetKitchenTimer",
            Self::KitchenMinuteTens => "KitchenMinuteTens",
            Self::KitchenMinuteOnes => "KitchenMinuteOnes",
            Self::KitchenSecondTens => "KitchenSecondTens",
            Self::KitchenSecondOnes => "KitchenSecondOnes",
            Self::DisplayTimer => "DisplayTimer",
            Self::TimerRunning => "TimerRunning",
            Self::TimerPaused => "TimerPaused",
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Inputs to the oven machine: button presses, timer expiries and raised
/// completion events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvenEvent {
    Clock,
    CookTime,
    PowerLevel,
    KitchenTimer,
    Stop,
    Start,
    Digit(u8),
    /// Skip to the next field without changing the current one.
    NextDigit,
    /// Jump to a specific field (MOD_* buttons).
    Select(DigitPosition),
    StateRequest,
    ClockTick,
    BlinkTick,
    CountdownTick,
    DisplayTimerDone,
}

/// Payload-free discriminant of [`OvenEvent`], used as transition trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvenTrigger {
    Clock,
    CookTime,
    PowerLevel,
    KitchenTimer,
    Stop,
    Start,
    Digit,
    NextDigit,
    Select,
    StateRequest,
    ClockTick,
    BlinkTick,
    CountdownTick,
    DisplayTimerDone,
}

impl Trigger for OvenEvent {
    type Kind = OvenTrigger;

    fn kind(&self) -> OvenTrigger {
        match self {
            Self::Clock => OvenTrigger::Clock,
            Self::CookTime => OvenTrigger::CookTime,
            Self::PowerLevel => OvenTrigger::PowerLevel,
            Self::KitchenTimer => OvenTrigger::KitchenTimer,
            Self::Stop => OvenTrigger::Stop,
            Self::Start => OvenTrigger::Start,
            Self::Digit(_) => OvenTrigger::Digit,
            Self::NextDigit => OvenTrigger::NextDigit,
            Self::Select(_) => OvenTrigger::Select,
            Self::StateRequest => OvenTrigger::StateRequest,
            Self::ClockTick => OvenTrigger::ClockTick,
            Self::BlinkTick => OvenTrigger::BlinkTick,
            Self::CountdownTick => OvenTrigger::CountdownTick,
            Self::DisplayTimerDone => OvenTrigger::DisplayTimerDone,
        }
    }
}

impl OvenEvent {
    /// Map a received SIGNAL to a button event.  Signals the oven has no
    /// use for (BLINK, NONE) map to `None`.
    pub fn from_signal(signal: SignalCode) -> Option<Self> {
        if let Some(d) = signal.as_digit() {
            return Some(Self::Digit(d));
        }
        if let Some(pos) = signal.as_select() {
            return Some(Self::Select(pos));
        }
        let event = match signal {
            SignalCode::Clock => Self::Clock,
            SignalCode::CookTime => Self::CookTime,
            SignalCode::PowerLevel => Self::PowerLevel,
            SignalCode::KitchenTimer => Self::KitchenTimer,
            SignalCode::Stop => Self::Stop,
            SignalCode::Start => Self::Start,
            SignalCode::StateRequest => Self::StateRequest,
            _ => return None,
        };
        Some(event)
    }

    fn from_timer(id: TimerId) -> Option<Self> {
        match id {
            TimerId::ClockMinute => Some(Self::ClockTick),
            TimerId::Blink => Some(Self::BlinkTick),
            TimerId::Countdown => Some(Self::CountdownTick),
            TimerId::StateRequest | TimerId::PowerFlash => None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// OvenService
// ───────────────────────────────────────────────────────────────

/// The oven service orchestrates the oven domain.
pub struct OvenService {
    machine: Hfsm<OvenState, OvenContext, OvenEvent>,
    ctx: OvenContext,
    decoder: StreamDecoder,
}

impl OvenService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the machine; call [`start`](Self::start) next.
    pub fn new(config: OvenConfig) -> Result<Self> {
        config.validate()?;
        let (machine, lock) = states::build_machine()?;
        let mut ctx = OvenContext::new(config);
        ctx.edit_lock = lock;
        Ok(Self {
            machine,
            ctx,
            decoder: StreamDecoder::new(Destination::Dev),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter the initial configuration and announce it.
    pub fn start(&mut self, io: &mut (impl FrameSink + DisplayPort)) -> Result<()> {
        self.machine.start(&mut self.ctx)?;
        self.run_raised()?;
        self.flush(io);
        info!("OvenService started in {:?}", self.state());
        Ok(())
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Dispatch one event and everything it raises, then flush outputs.
    pub fn handle_event(
        &mut self,
        event: OvenEvent,
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<Dispatch> {
        let outcome = self.machine.dispatch(&mut self.ctx, &event)?;
        self.run_raised()?;
        self.flush(io);
        Ok(outcome)
    }

    /// Handle one decoded frame.  Frames not addressed to the oven, and
    /// anything but SIGNAL frames, are ignored.
    pub fn handle_frame(
        &mut self,
        frame: &Frame,
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
        let event = match (frame.destination, frame.code) {
            (Destination::Dev, Code::Signal(signal)) => OvenEvent::from_signal(signal),
            _ => None,
        };
        match event {
            Some(event) => {
                self.handle_event(event, io)?;
            }
            None => trace!("oven: ignoring {:?}", frame.code),
        }
        Ok(())
    }

    /// Feed raw bytes from a stream transport.
    pub fn receive_bytes(
        &mut self,
        bytes: &[u8],
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
        // A chunk no longer than a frame completes at most one frame.
        for chunk in bytes.chunks(FRAME_LEN) {
            let mut frames: Vec<Frame, 2> = Vec::new();
            self.decoder.feed(chunk, |f| {
                let _ = frames.push(f);
            });
            for frame in &frames {
                self.handle_frame(frame, io)?;
            }
        }
        Ok(())
    }

    /// Handle one datagram carrying exactly one frame.  Malformed datagrams
    /// are dropped.
    pub fn receive_datagram(
        &mut self,
        bytes: &[u8],
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
        match Frame::decode(bytes) {
            Ok(frame) => self.handle_frame(&frame, io),
            Err(e) => {
                debug!("oven: dropping datagram ({})", e);
                Ok(())
            }
        }
    }

    /// Handle one datagram in the legacy command-word format.
    pub fn receive_legacy(
        &mut self,
        bytes: &[u8],
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
        match codec::legacy::decode(bytes, Destination::Dev) {
            Ok(frame) => self.handle_frame(&frame, io),
            Err(e) => {
                debug!("oven: dropping legacy datagram ({})", e);
                Ok(())
            }
        }
    }

    /// Advance time by `elapsed_ms`, dispatching timer expiries one at a
    /// time in deadline order.
    pub fn advance(
        &mut self,
        elapsed_ms: u32,
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
        let mut budget = elapsed_ms;
        while let Some(id) = self.ctx.timers.pop_expired(&mut budget) {
            if let Some(event) = OvenEvent::from_timer(id) {
                self.handle_event(event, io)?;
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Active leaf state, `None` before [`start`](Self::start).
    pub fn state(&self) -> Option<OvenState> {
        self.machine.active_leaf()
    }

    /// True if `state` is on the active path.
    pub fn is_in(&self, state: OvenState) -> bool {
        self.machine.is_active(state)
    }

    /// Identity most recently announced to the panel.
    pub fn identity(&self) -> StateCode {
        self.ctx.identity
    }

    /// Current time of day.
    pub fn clock(&self) -> Time {
        self.ctx.clock
    }

    /// Value being typed while the clock is being set.
    pub fn proposed_clock(&self) -> Time {
        self.ctx.proposed
    }

    /// Stage `index` of the cook program.
    pub fn cook_entry(&self, index: usize) -> Option<&CookEntry> {
        self.ctx.cook.get(index)
    }

    pub fn cook_index(&self) -> usize {
        self.ctx.cook_index
    }

    /// The DisplayClock transitions locked while the clock is set.
    pub fn edit_lock(&self) -> &[TransitionId] {
        &self.ctx.edit_lock
    }

    /// Whether a transition in the edit lock is currently enabled.
    pub fn is_transition_enabled(&self, id: TransitionId) -> bool {
        self.machine.is_transition_enabled(id)
    }

    pub fn is_timer_running(&self, id: TimerId) -> bool {
        self.ctx.timers.is_running(id)
    }

    pub fn config(&self) -> &OvenConfig {
        &self.ctx.config
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn run_raised(&mut self) -> Result<()> {
        while let Some(event) = self.ctx.raised.pop_front() {
            self.machine.dispatch(&mut self.ctx, &event)?;
        }
        Ok(())
    }

    fn flush(&mut self, io: &mut (impl FrameSink + DisplayPort)) {
        self.ctx.outbox.drain_into(io);
    }
}
