//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   state actions ──▶ Outbox ──▶ Service::flush ──▶ FrameSink / DisplayPort
//! ```
//!
//! State actions never touch a port directly.  They write [`Outbound`]
//! items into the context's [`Outbox`]; after each event the service
//! drains the outbox into the ports it was handed, in order.  Adapters
//! (socket transports, GUI widgets, test recorders) implement the traits.

use heapless::Deque;
use log::warn;

use crate::codec::Frame;
use crate::time::{DigitPosition, Time};

// ───────────────────────────────────────────────────────────────
// Frame sink (domain → peer process)
// ───────────────────────────────────────────────────────────────

/// Write-side port for protocol frames.
pub trait FrameSink {
    /// Send one frame.  Delivery failures are the adapter's concern.
    fn send(&mut self, frame: &Frame);
}

// ───────────────────────────────────────────────────────────────
// Display port (domain → four-digit display)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the four-digit display.
pub trait DisplayPort {
    /// Show `digit` at `pos`; `None` blanks the position.
    fn set_digit(&mut self, pos: DigitPosition, digit: Option<u8>);

    /// Show or hide the colon between the digit pairs.
    fn set_colon(&mut self, on: bool);

    /// Switch to the power-level view showing `level` (1-10).
    fn set_power_display(&mut self, level: u8);
}

// ───────────────────────────────────────────────────────────────
// Outbox
// ───────────────────────────────────────────────────────────────

/// One display write, queued by a state action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCommand {
    Digit(DigitPosition, Option<u8>),
    Colon(bool),
    Power(u8),
}

/// Anything a state action asks the service to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    Frame(Frame),
    Display(DisplayCommand),
}

/// Maximum queued outbound items between two flushes.
pub const OUTBOX_CAPACITY: usize = 48;

/// Ordered buffer of outbound items written by state actions.
#[derive(Default)]
pub struct Outbox {
    items: Deque<Outbound, OUTBOX_CAPACITY>,
    dropped: u32,
}

impl Outbox {
    /// An empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `item`; logs and counts it if the outbox is full.
    pub fn push(&mut self, item: Outbound) {
        if self.items.push_back(item).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            warn!("outbox full, dropping {:?}", item);
        }
    }

    /// Queue a frame for the [`FrameSink`].
    pub fn frame(&mut self, frame: Frame) {
        self.push(Outbound::Frame(frame));
    }

    /// Queue a command for the [`DisplayPort`].
    pub fn display(&mut self, cmd: DisplayCommand) {
        self.push(Outbound::Display(cmd));
    }

    /// Write all four digits of `time` and set the colon.
    pub fn show_time(&mut self, time: &Time, colon: bool) {
        for pos in DigitPosition::ALL {
            self.display(DisplayCommand::Digit(pos, Some(time.digit(pos))));
        }
        self.display(DisplayCommand::Colon(colon));
    }

    /// Show or blank a single position of `time`.
    pub fn show_digit(&mut self, time: &Time, pos: DigitPosition, visible: bool) {
        let digit = visible.then(|| time.digit(pos));
        self.display(DisplayCommand::Digit(pos, digit));
    }

    /// Show the power level in place of the time.
    pub fn show_power(&mut self, level: u8) {
        self.display(DisplayCommand::Power(level));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items lost to overflow since construction.
    pub fn dropped_count(&self) -> u32 {
        self.dropped
    }

    /// Take the oldest queued item.
    pub fn pop(&mut self) -> Option<Outbound> {
        self.items.pop_front()
    }

    /// Hand every queued item to the ports, oldest first.
    pub fn drain_into(&mut self, io: &mut (impl FrameSink + DisplayPort)) {
        while let Some(item) = self.items.pop_front() {
            match item {
                Outbound::Frame(frame) => io.send(&frame),
                Outbound::Display(DisplayCommand::Digit(pos, d)) => io.set_digit(pos, d),
                Outbound::Display(DisplayCommand::Colon(on)) => io.set_colon(on),
                Outbound::Display(DisplayCommand::Power(level)) => io.set_power_display(level),
            }
        }
    }
}
