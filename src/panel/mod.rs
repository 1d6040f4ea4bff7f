//! Panel (application) side: the remote front panel that mirrors the oven.
//!
//! [`PanelService`] forwards button presses to the oven as SIGNAL frames and
//! follows the oven's STATE, UPDATE and BLINK frames to drive its display.
//! It never decides anything on its own beyond polling for the oven's state
//! while it has none.

pub mod context;
pub mod states;

use heapless::Vec;
use log::{debug, info, trace};

use crate::app::ports::{DisplayPort, FrameSink};
use crate::codec::stream::StreamDecoder;
use crate::codec::{
    self, Code, Destination, FRAME_LEN, Frame, PAYLOAD_LEN, SignalCode, StateCode, UpdateCode,
};
use crate::config::OvenConfig;
use crate::error::Result;
use crate::hfsm::{Dispatch, Hfsm, StateSet, Trigger};
use crate::time::Time;
use crate::timers::TimerId;

use context::{PanelContext, View};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every panel state.  Must stay in sync with [`states::build_machine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PanelState {
    Panel = 0,
    Connecting = 1,
    DisplayClock = 2,
    ClockIdle = 3,
    SetClock = 4,
    ClockHourTens = 5,
    ClockHourOnes = 6,
    ClockMinuteTens = 7,
    ClockMinuteOnes = 8,
    SetCookTimer = 9,
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

impl StateSet for PanelState {
    const COUNT: usize = 19;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Panel => "Panel",
            Self::Connecting => "Connecting",
            Self::DisplayClock => "DisplayClock",
            Self::ClockIdle => "ClockIdle",
            Self::SetClock => "SetClock",
            Self::ClockHourTens => "ClockHourTens",
            Self::ClockHourOnes => "ClockHourOnes",
            Self::ClockMinuteTens => "ClockMinuteTens",
            Self::ClockMinuteOnes => "ClockMinuteOnes",
            Self::SetCookTimer => "SetCookTimer",
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

/// Inputs to the panel machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// A local button press, forwarded to the oven.
    Press(SignalCode),
    /// The oven announced its active state.
    State {
        code: StateCode,
        payload: [u8; PAYLOAD_LEN],
    },
    /// The oven pushed a new value.
    Update {
        code: UpdateCode,
        payload: [u8; PAYLOAD_LEN],
    },
    /// Blink phase from the oven (`true` = visible).
    Blink(bool),
    StateRequestTick,
    PowerFlashDone,
    /// The link to the oven was lost.
    Disconnected,
}

/// Payload-free discriminant of [`PanelEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelTrigger {
    Press,
    State,
    Update,
    Blink,
    StateRequestTick,
    PowerFlashDone,
    Disconnected,
}

impl Trigger for PanelEvent {
    type Kind = PanelTrigger;

    fn kind(&self) -> PanelTrigger {
        match self {
            Self::Press(_) => PanelTrigger::Press,
            Self::State { .. } => PanelTrigger::State,
            Self::Update { .. } => PanelTrigger::Update,
            Self::Blink(_) => PanelTrigger::Blink,
            Self::StateRequestTick => PanelTrigger::StateRequestTick,
            Self::PowerFlashDone => PanelTrigger::PowerFlashDone,
            Self::Disconnected => PanelTrigger::Disconnected,
        }
    }
}

impl PanelEvent {
    /// Map a frame from the oven to a panel event.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        match frame.code {
            Code::State(StateCode::None) | Code::Update(UpdateCode::None) => None,
            Code::State(code) => Some(Self::State {
                code,
                payload: frame.payload,
            }),
            Code::Update(code) => Some(Self::Update {
                code,
                payload: frame.payload,
            }),
            Code::Signal(SignalCode::BlinkOn) => Some(Self::Blink(true)),
            Code::Signal(SignalCode::BlinkOff) => Some(Self::Blink(false)),
            Code::Signal(_) => None,
        }
    }

    fn from_timer(id: TimerId) -> Option<Self> {
        match id {
            TimerId::StateRequest => Some(Self::StateRequestTick),
            TimerId::PowerFlash => Some(Self::PowerFlashDone),
            TimerId::ClockMinute | TimerId::Blink | TimerId::Countdown => None,
        }
    }
}

pub(crate) fn state_frame(code: StateCode, payload: [u8; PAYLOAD_LEN]) -> Frame {
    Frame {
        destination: Destination::App,
        code: Code::State(code),
        payload,
    }
}

pub(crate) fn update_frame(code: UpdateCode, payload: [u8; PAYLOAD_LEN]) -> Frame {
    Frame {
        destination: Destination::App,
        code: Code::Update(code),
        payload,
    }
}

// ───────────────────────────────────────────────────────────────
// PanelService
// ───────────────────────────────────────────────────────────────

/// The panel service orchestrates the panel domain.
pub struct PanelService {
    machine: Hfsm<PanelState, PanelContext, PanelEvent>,
    ctx: PanelContext,
    decoder: StreamDecoder,
}

impl PanelService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the machine; call [`start`](Self::start) next.
    pub fn new(config: OvenConfig) -> Result<Self> {
        config.validate()?;
        let machine = states::build_machine()?;
        Ok(Self {
            machine,
            ctx: PanelContext::new(config),
            decoder: StreamDecoder::new(Destination::App),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Blank the display and start asking the oven for its state.
    pub fn start(&mut self, io: &mut (impl FrameSink + DisplayPort)) -> Result<()> {
        self.machine.start(&mut self.ctx)?;
        self.flush(io);
        info!("PanelService started in {:?}", self.state());
        Ok(())
    }

    /// The link dropped: forget the stream and resynchronize.
    pub fn disconnected(&mut self, io: &mut (impl FrameSink + DisplayPort)) -> Result<()> {
        self.decoder.reset();
        self.handle_event(PanelEvent::Disconnected, io)?;
        Ok(())
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Dispatch one event, then flush what it produced to `io`.
    pub fn handle_event(
        &mut self,
        event: PanelEvent,
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<Dispatch> {
        let outcome = self.machine.dispatch(&mut self.ctx, &event)?;
        self.flush(io);
        Ok(outcome)
    }

    /// A local button was pressed.
    pub fn press(
        &mut self,
        signal: SignalCode,
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
        self.handle_event(PanelEvent::Press(signal), io)?;
        Ok(())
    }

    /// Handle one decoded frame.  Frames not addressed to the panel are
    /// ignored.
    pub fn handle_frame(
        &mut self,
        frame: &Frame,
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
        let event = match frame.destination {
            Destination::App => PanelEvent::from_frame(frame),
            Destination::Dev => None,
        };
        match event {
            Some(event) => {
                self.handle_event(event, io)?;
            }
            None => trace!("panel: ignoring {:?}", frame.code),
        }
        Ok(())
    }

    /// Feed raw bytes from a stream transport.
    pub fn receive_bytes(
        &mut self,
        bytes: &[u8],
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
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

    /// Handle one datagram carrying exactly one frame.
    pub fn receive_datagram(
        &mut self,
        bytes: &[u8],
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
        match Frame::decode(bytes) {
            Ok(frame) => self.handle_frame(&frame, io),
            Err(e) => {
                debug!("panel: dropping datagram ({})", e);
                Ok(())
            }
        }
    }

    /// Handle one datagram in the legacy command-word format.  The legacy
    /// blink word carries no phase, so it toggles.
    pub fn receive_legacy(
        &mut self,
        bytes: &[u8],
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
        let frame = match codec::legacy::decode(bytes, Destination::App) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("panel: dropping legacy datagram ({})", e);
                return Ok(());
            }
        };
        if frame.code == Code::Signal(SignalCode::BlinkOn) {
            let phase = !self.ctx.blink_on;
            self.handle_event(PanelEvent::Blink(phase), io)?;
            return Ok(());
        }
        self.handle_frame(&frame, io)
    }

    /// Advance time by `elapsed_ms`.
    pub fn advance(
        &mut self,
        elapsed_ms: u32,
        io: &mut (impl FrameSink + DisplayPort),
    ) -> Result<()> {
        let mut budget = elapsed_ms;
        while let Some(id) = self.ctx.timers.pop_expired(&mut budget) {
            if let Some(event) = PanelEvent::from_timer(id) {
                self.handle_event(event, io)?;
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Active leaf state, `None` before [`start`](Self::start).
    pub fn state(&self) -> Option<PanelState> {
        self.machine.active_leaf()
    }

    /// True if `state` is active or an ancestor of the active leaf.
    pub fn is_in(&self, state: PanelState) -> bool {
        self.machine.is_active(state)
    }

    /// Identity of the oven state currently mirrored.
    pub fn identity(&self) -> StateCode {
        self.ctx.identity
    }

    /// True once the oven has announced a state.
    pub fn is_synchronized(&self) -> bool {
        self.machine.is_started() && !self.is_in(PanelState::Connecting)
    }

    /// What the display currently shows.
    pub fn view(&self) -> View {
        self.ctx.view
    }

    /// Last clock value received from the oven.
    pub fn clock(&self) -> Time {
        self.ctx.clock
    }

    /// Last countdown value received from the oven.
    pub fn timer(&self) -> Time {
        self.ctx.timer
    }

    pub fn power_level(&self) -> u8 {
        self.ctx.power_level
    }

    pub fn is_timer_running(&self, id: TimerId) -> bool {
        self.ctx.timers.is_running(id)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn flush(&mut self, io: &mut (impl FrameSink + DisplayPort)) {
        self.ctx.outbox.drain_into(io);
    }
}
