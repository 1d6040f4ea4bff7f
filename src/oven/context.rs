//! Shared mutable context threaded through every oven state handler.
//!
//! `OvenContext` is the "blackboard" the oven's state actions read from
//! and write to: the clock, the two cook entries, the field being edited,
//! timers, and the outbox that the service later drains into the ports.

use heapless::{Deque, Vec};
use log::warn;

use crate::app::ports::Outbox;
use crate::codec::{Destination, Frame, SignalCode, StateCode, UpdateCode};
use crate::config::OvenConfig;
use crate::hfsm::TransitionId;
use crate::time::{CookEntry, DigitPosition, Time};
use crate::timers::{TimerId, TimerMode, Timers};

use super::OvenEvent;

/// Which value the user is currently editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    None,
    SetClock,
    SetCook,
    SetPower,
    SetKitchen,
    Countdown,
}

/// Events raised by actions, processed after the current one completes.
pub const RAISED_CAPACITY: usize = 8;

/// Number of oven timers that can run at once.
pub const OVEN_TIMERS: usize = 4;

/// The shared context passed to every oven handler.
pub struct OvenContext {
    // -- Configuration --
    pub config: OvenConfig,

    // -- Clock --
    /// Time of day, advanced by the minute timer.
    pub clock: Time,
    /// Clock value being edited; committed on accept.
    pub proposed: Time,

    // -- Cooking --
    /// Primary and queued cook stages.
    pub cook: [CookEntry; 2],
    /// Stage currently being edited or counted down.
    pub cook_index: usize,
    /// The next cook-time digit seeds the ones position directly.
    pub first_digit: bool,

    // -- Editing --
    pub mode: EditMode,
    /// Digit position targeted by the next accepted digit.
    pub field: Option<DigitPosition>,
    /// Current blink phase (`true` = visible).
    pub blink_on: bool,
    /// Identity announced for the active leaf.
    pub identity: StateCode,

    // -- Engine plumbing --
    pub timers: Timers<TimerId, OVEN_TIMERS>,
    /// DisplayClock transitions suppressed while the clock is being set.
    pub edit_lock: Vec<TransitionId, 4>,
    pub raised: Deque<OvenEvent, RAISED_CAPACITY>,
    pub outbox: Outbox,
}

impl OvenContext {
    /// Fresh context: the configured clock, an empty cook program, nothing queued.
    pub fn new(config: OvenConfig) -> Self {
        Self {
            clock: config.initial_clock,
            proposed: Time::ZERO,
            cook: [CookEntry::default(); 2],
            cook_index: 0,
            first_digit: true,
            mode: EditMode::None,
            field: None,
            blink_on: true,
            identity: StateCode::None,
            timers: Timers::new(),
            edit_lock: Vec::new(),
            raised: Deque::new(),
            outbox: Outbox::new(),
            config,
        }
    }

    // ── Cook entries ──────────────────────────────────────────

    /// The cook stage being edited or counted down.
    pub fn active_entry(&self) -> &CookEntry {
        &self.cook[self.cook_index]
    }

    pub fn active_entry_mut(&mut self) -> &mut CookEntry {
        &mut self.cook[self.cook_index]
    }

    /// Forget both stages and start over at stage 0.
    pub fn reset_cook(&mut self) {
        let entry = CookEntry {
            timer: Time::ZERO,
            power_level: self.config.default_power_level,
        };
        self.cook = [entry; 2];
        self.cook_index = 0;
    }

    // ── Timers ────────────────────────────────────────────────

    /// Arm `id` with its configured period.
    pub fn start_timer(&mut self, id: TimerId, mode: TimerMode) {
        let period = match id {
            TimerId::ClockMinute => self.config.clock_tick_ms,
            TimerId::Blink => self.config.blink_interval_ms,
            TimerId::Countdown => self.config.countdown_interval_ms,
            TimerId::StateRequest => self.config.state_request_interval_ms,
            TimerId::PowerFlash => self.config.power_flash_ms,
        };
        self.timers.start(id, period, mode);
    }

    // ── Raised events ─────────────────────────────────────────

    /// Queue `event` for the service to dispatch once the current step completes.
    pub fn raise(&mut self, event: OvenEvent) {
        if self.raised.push_back(event).is_err() {
            warn!("oven: raised-event queue full, dropping {:?}", event);
        }
    }

    // ── Outbound frames ───────────────────────────────────────

    /// Tell the panel about a button the oven acted on.
    pub fn signal(&mut self, signal: SignalCode) {
        self.outbox.frame(Frame::signal(Destination::App, signal));
    }

    /// Push a clock value to the panel.
    pub fn update_clock(&mut self, time: Time) {
        self.outbox
            .frame(Frame::update_time(Destination::App, UpdateCode::Clock, &time));
    }

    /// Push the active stage's countdown to the panel.
    pub fn update_timer(&mut self) {
        let timer = self.active_entry().timer;
        self.outbox.frame(Frame::update_time(
            Destination::App,
            UpdateCode::DisplayTimer,
            &timer,
        ));
    }

    /// Push the active stage's power level to the panel.
    pub fn update_power(&mut self) {
        let level = self.active_entry().power_level;
        self.outbox.frame(Frame::update_power(Destination::App, level));
    }

    /// Broadcast the active leaf's identity and authoritative value: one
    /// STATE frame followed by the matching UPDATE frame.
    pub fn announce(&mut self) {
        let identity = self.identity;
        match identity {
            StateCode::None => {}
            StateCode::DisplayClock => {
                let clock = self.clock;
                self.outbox
                    .frame(Frame::state_time(Destination::App, identity, &clock));
                self.update_clock(clock);
            }
            StateCode::ClockSelectHourTens
            | StateCode::ClockSelectHourOnes
            | StateCode::ClockSelectMinuteTens
            | StateCode::ClockSelectMinuteOnes => {
                let proposed = self.proposed;
                self.outbox
                    .frame(Frame::state_time(Destination::App, identity, &proposed));
                self.update_clock(proposed);
            }
            StateCode::SetPowerLevel => {
                let level = self.active_entry().power_level;
                self.outbox
                    .frame(Frame::state_power(Destination::App, identity, level));
                self.update_power();
            }
            StateCode::SetCookTimer
            | StateCode::KitchenSelectMinuteTens
            | StateCode::KitchenSelectMinuteOnes
            | StateCode::KitchenSelectSecondTens
            | StateCode::KitchenSelectSecondOnes
            | StateCode::DisplayTimer
            | StateCode::DisplayTimerPaused => {
                let timer = self.active_entry().timer;
                self.outbox
                    .frame(Frame::state_time(Destination::App, identity, &timer));
                self.update_timer();
            }
        }
    }

    // ── Local display ─────────────────────────────────────────

    /// Redraw the local display for `time`, blanking the edited field
    /// during the off phase of the blink.
    pub fn show_editing(&mut self, time: Time) {
        self.outbox.show_time(&time, true);
        if let Some(field) = self.field {
            if !self.blink_on {
                self.outbox.show_digit(&time, field, false);
            }
        }
    }
}
