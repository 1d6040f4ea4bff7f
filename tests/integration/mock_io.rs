//! Mock I/O for integration tests.
//!
//! Each side of the link gets a [`MockSide`]: a four-digit screen model
//! plus an outgoing byte wire.  [`Bench`] wires an oven and a panel
//! together and pumps bytes between them until both go quiet.

use ovenpanel::app::ports::{DisplayPort, FrameSink};
use ovenpanel::codec::{Frame, SignalCode};
use ovenpanel::config::OvenConfig;
use ovenpanel::oven::OvenService;
use ovenpanel::panel::PanelService;
use ovenpanel::time::DigitPosition;

/// Time step used by [`Bench::advance`].
pub const STEP_MS: u32 = 100;

// ── Screen model ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Screen {
    pub digits: [Option<u8>; 4],
    pub colon: bool,
    /// Set while the power level is shown instead of digits.
    pub power: Option<u8>,
}

impl Screen {
    /// `"12:34"`, with blanked digits as spaces and an unlit colon as a space.
    pub fn text(&self) -> String {
        let c = |d: Option<u8>| d.map_or(' ', |d| char::from(b'0' + d));
        format!(
            "{}{}{}{}{}",
            c(self.digits[0]),
            c(self.digits[1]),
            if self.colon { ':' } else { ' ' },
            c(self.digits[2]),
            c(self.digits[3]),
        )
    }
}

// ── MockSide ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSide {
    pub screen: Screen,
    /// Every frame sent, in order.
    pub sent: Vec<Frame>,
    /// Encoded bytes not yet delivered to the peer.
    pub wire: Vec<u8>,
}

#[allow(dead_code)]
impl MockSide {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_signal(&self, signal: SignalCode) -> bool {
        self.sent
            .iter()
            .any(|f| f.code == ovenpanel::codec::Code::Signal(signal))
    }
}

impl FrameSink for MockSide {
    fn send(&mut self, frame: &Frame) {
        self.sent.push(*frame);
        self.wire.extend_from_slice(&frame.encode());
    }
}

impl DisplayPort for MockSide {
    fn set_digit(&mut self, pos: DigitPosition, digit: Option<u8>) {
        self.screen.power = None;
        self.screen.digits[pos as usize] = digit;
    }

    fn set_colon(&mut self, on: bool) {
        self.screen.colon = on;
    }

    fn set_power_display(&mut self, level: u8) {
        self.screen.power = Some(level);
    }
}

// ── Bench ─────────────────────────────────────────────────────

pub struct Bench {
    pub oven: OvenService,
    pub panel: PanelService,
    pub oven_io: MockSide,
    pub panel_io: MockSide,
    /// While false, bytes on either wire are lost.
    pub link_up: bool,
}

#[allow(dead_code)]
impl Bench {
    /// Both sides started and synchronized.
    pub fn new() -> Self {
        let mut bench = Self::unstarted(OvenConfig::default());
        bench.oven.start(&mut bench.oven_io).unwrap();
        bench.panel.start(&mut bench.panel_io).unwrap();
        bench.pump();
        bench
    }

    pub fn unstarted(config: OvenConfig) -> Self {
        Self {
            oven: OvenService::new(config.clone()).unwrap(),
            panel: PanelService::new(config).unwrap(),
            oven_io: MockSide::new(),
            panel_io: MockSide::new(),
            link_up: true,
        }
    }

    /// Deliver queued bytes both ways until nothing is left in flight.
    pub fn pump(&mut self) {
        for _ in 0..64 {
            if self.oven_io.wire.is_empty() && self.panel_io.wire.is_empty() {
                return;
            }
            let to_panel = std::mem::take(&mut self.oven_io.wire);
            let to_oven = std::mem::take(&mut self.panel_io.wire);
            if !self.link_up {
                continue;
            }
            self.panel.receive_bytes(&to_panel, &mut self.panel_io).unwrap();
            self.oven.receive_bytes(&to_oven, &mut self.oven_io).unwrap();
        }
        panic!("link never went quiet");
    }

    /// Press a button on the panel and let the exchange settle.
    pub fn press(&mut self, signal: SignalCode) {
        self.panel.press(signal, &mut self.panel_io).unwrap();
        self.pump();
    }

    pub fn press_all(&mut self, signals: &[SignalCode]) {
        for s in signals {
            self.press(*s);
        }
    }

    pub fn digits(&mut self, digits: &[u8]) {
        for d in digits {
            self.press(SignalCode::digit(*d).unwrap());
        }
    }

    /// Let `ms` pass on both sides in small steps.
    pub fn advance(&mut self, ms: u32) {
        let mut left = ms;
        while left > 0 {
            let step = left.min(STEP_MS);
            self.oven.advance(step, &mut self.oven_io).unwrap();
            self.panel.advance(step, &mut self.panel_io).unwrap();
            self.pump();
            left -= step;
        }
    }

    pub fn panel_text(&self) -> String {
        self.panel_io.screen.text()
    }

    pub fn oven_text(&self) -> String {
        self.oven_io.screen.text()
    }
}
