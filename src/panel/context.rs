//! Shared mutable context threaded through every panel state handler.
//!
//! The panel holds no authoritative data.  It mirrors the values the oven
//! announces and remembers which view is on screen so that any update or
//! blink notification can redraw it.

use crate::app::ports::{DisplayCommand, Outbox};
use crate::codec::{Destination, Frame, SignalCode, StateCode};
use crate::config::OvenConfig;
use crate::time::{DigitPosition, MAX_POWER_LEVEL, Time};
use crate::timers::{TimerId, TimerMode, Timers};

/// What the display is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Nothing known yet.
    Blank,
    Clock,
    Timer,
    Power,
}

/// Number of panel timers that can run at once.
pub const PANEL_TIMERS: usize = 4;

/// The shared context passed to every panel handler.
pub struct PanelContext {
    pub config: OvenConfig,

    // -- Mirrored values --
    /// Clock as last reported (the proposed clock while it is being set).
    pub clock: Time,
    /// Countdown as last reported.
    pub timer: Time,
    pub power_level: u8,

    // -- Presentation --
    /// State identity the panel currently mirrors.
    pub identity: StateCode,
    pub view: View,
    /// Field shown blinking while a value is edited.
    pub field: Option<DigitPosition>,
    pub blink_on: bool,
    /// Power level temporarily shown over the countdown.
    pub flashing_power: bool,

    pub timers: Timers<TimerId, PANEL_TIMERS>,
    pub outbox: Outbox,
}

impl PanelContext {
    /// Fresh context: blank view, nothing known about the oven yet.
    pub fn new(config: OvenConfig) -> Self {
        Self {
            clock: config.initial_clock,
            timer: Time::ZERO,
            power_level: MAX_POWER_LEVEL,
            identity: StateCode::None,
            view: View::Blank,
            field: None,
            blink_on: true,
            flashing_power: false,
            timers: Timers::new(),
            outbox: Outbox::new(),
            config,
        }
    }

    /// Arm `id` with its configured period.
    pub fn start_timer(&mut self, id: TimerId, mode: TimerMode) {
        let period = match id {
            TimerId::StateRequest => self.config.state_request_interval_ms,
            TimerId::PowerFlash => self.config.power_flash_ms,
            TimerId::Blink => self.config.blink_interval_ms,
            TimerId::ClockMinute => self.config.clock_tick_ms,
            TimerId::Countdown => self.config.countdown_interval_ms,
        };
        self.timers.start(id, period, mode);
    }

    /// Queue a SIGNAL frame for the oven.
    pub fn send(&mut self, signal: SignalCode) {
        self.outbox.frame(Frame::signal(Destination::Dev, signal));
    }

    /// Switch to `view` mirroring `identity`, then draw it.
    pub fn show(&mut self, identity: StateCode, view: View, field: Option<DigitPosition>) {
        self.identity = identity;
        self.view = view;
        self.field = field;
        self.blink_on = true;
        self.render();
    }

    /// Redraw the current view from the mirrored values.
    pub fn render(&mut self) {
        if self.flashing_power {
            self.outbox.show_power(self.power_level);
            return;
        }
        match self.view {
            View::Blank => {
                for pos in DigitPosition::ALL {
                    self.outbox.display(DisplayCommand::Digit(pos, None));
                }
                self.outbox.display(DisplayCommand::Colon(false));
            }
            View::Power => self.outbox.show_power(self.power_level),
            View::Clock | View::Timer => {
                let value = if self.view == View::Clock {
                    self.clock
                } else {
                    self.timer
                };
                match self.field {
                    Some(field) => {
                        self.outbox.show_time(&value, true);
                        if !self.blink_on {
                            self.outbox.show_digit(&value, field, false);
                        }
                    }
                    // Idle clock blinks its colon; a countdown keeps it lit.
                    None => {
                        let colon = self.view == View::Timer || self.blink_on;
                        self.outbox.show_time(&value, colon);
                    }
                }
            }
        }
    }
}
