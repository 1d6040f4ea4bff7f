//! Property and fuzz-style tests for robustness of the codec, the time
//! arithmetic and the oven/panel pair.
//!
//! Runs on host only; proptest is not available for embedded targets.

#![cfg(not(target_os = "espidf"))]

use ovenpanel::app::ports::{DisplayPort, FrameSink};
use ovenpanel::codec::stream::StreamDecoder;
use ovenpanel::codec::{Code, Destination, Frame, SignalCode, StateCode, UpdateCode};
use ovenpanel::config::OvenConfig;
use ovenpanel::oven::OvenService;
use ovenpanel::panel::PanelService;
use ovenpanel::time::{DigitPosition, Time};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────

fn any_time() -> impl Strategy<Value = Time> {
    (0u8..=9, 0u8..=9, 0u8..=5, 0u8..=9).prop_map(|(a, b, c, d)| Time::new(a, b, c, d))
}

fn any_clock() -> impl Strategy<Value = Time> {
    (0u32..24 * 60).prop_map(|m| {
        let (h, m) = (m / 60, m % 60);
        Time::new((h / 10) as u8, (h % 10) as u8, (m / 10) as u8, (m % 10) as u8)
    })
}

fn any_code() -> impl Strategy<Value = Code> {
    prop_oneof![
        prop::sample::select(StateCode::ALL.to_vec()).prop_map(Code::State),
        prop::sample::select(SignalCode::ALL.to_vec()).prop_map(Code::Signal),
        prop::sample::select(UpdateCode::ALL.to_vec()).prop_map(Code::Update),
    ]
}

fn any_frame(dst: Destination) -> impl Strategy<Value = Frame> {
    (any_code(), any::<[u8; 16]>()).prop_map(move |(code, payload)| Frame {
        destination: dst,
        code,
        payload,
    })
}

/// Line noise that can never contain a destination marker.
fn noise() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0u8..0x40, 0..40)
}

/// The value as a count of its smallest unit.
fn flat(t: &Time) -> u32 {
    t.left() * 60 + t.right()
}

// ── Codec ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn frame_survives_the_wire(frame in any_frame(Destination::App)) {
        prop_assert_eq!(Frame::decode(&frame.encode()), Ok(frame));
    }

    /// Frames interleaved with noise and cut at arbitrary points come out
    /// whole and in order; frames for the other side never do.
    #[test]
    fn stream_resyncs_after_noise(
        items in proptest::collection::vec(
            (noise(), any_frame(Destination::Dev), any::<bool>()),
            1..8,
        ),
        cut in 1usize..30,
    ) {
        let mut wire = Vec::new();
        let mut expected = Vec::new();
        for (junk, mut frame, for_us) in items {
            wire.extend_from_slice(&junk);
            if !for_us {
                frame.destination = Destination::App;
            } else {
                expected.push(frame);
            }
            wire.extend_from_slice(&frame.encode());
        }

        let mut decoder = StreamDecoder::new(Destination::Dev);
        let mut got = Vec::new();
        for chunk in wire.chunks(cut) {
            decoder.feed(chunk, |f| got.push(f));
        }
        prop_assert_eq!(got, expected);
    }
}

// ── Time arithmetic ───────────────────────────────────────────

proptest! {
    #[test]
    fn clock_advances_modulo_a_day(start in any_clock(), n in 0u32..3000) {
        let mut t = start;
        for _ in 0..n {
            t.advance_minute();
            prop_assert!(t.is_valid_clock());
        }
        prop_assert_eq!(flat(&t), (flat(&start) + n) % (24 * 60));
    }

    #[test]
    fn countdown_takes_exactly_its_length(start in any_time()) {
        let mut t = start;
        let mut ticks = 0u32;
        while !t.is_zero() {
            prop_assert!(t.right_tens <= 5);
            t.count_down();
            ticks += 1;
        }
        prop_assert_eq!(ticks, flat(&start));
    }

    #[test]
    fn quick_start_saturates(start in any_time(), secs in 0u32..10_000) {
        let mut t = start;
        t.add_seconds(secs);
        prop_assert!(t.right_tens <= 5);
        prop_assert_eq!(flat(&t), (flat(&start) + secs).min(99 * 60 + 59));
    }
}

// ── Oven and panel stay in step ───────────────────────────────

#[derive(Default)]
struct Side {
    wire: Vec<u8>,
}

impl FrameSink for Side {
    fn send(&mut self, frame: &Frame) {
        self.wire.extend_from_slice(&frame.encode());
    }
}

impl DisplayPort for Side {
    fn set_digit(&mut self, _pos: DigitPosition, _digit: Option<u8>) {}
    fn set_colon(&mut self, _on: bool) {}
    fn set_power_display(&mut self, _level: u8) {}
}

fn settle(oven: &mut OvenService, oven_io: &mut Side, panel: &mut PanelService, panel_io: &mut Side) {
    while !oven_io.wire.is_empty() || !panel_io.wire.is_empty() {
        let to_panel = std::mem::take(&mut oven_io.wire);
        let to_oven = std::mem::take(&mut panel_io.wire);
        panel.receive_bytes(&to_panel, panel_io).unwrap();
        oven.receive_bytes(&to_oven, oven_io).unwrap();
    }
}

#[derive(Debug, Clone)]
enum Step {
    Press(SignalCode),
    Wait(u32),
}

fn any_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => prop::sample::select(SignalCode::ALL.to_vec()).prop_map(Step::Press),
        1 => (1u32..30).prop_map(|n| Step::Wait(n * 100)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever the user presses, once the link is quiet the panel mirrors
    /// the oven's state and values.
    #[test]
    fn panel_mirrors_oven(steps in proptest::collection::vec(any_step(), 1..40)) {
        let config = OvenConfig::default();
        let mut oven = OvenService::new(config.clone()).unwrap();
        let mut panel = PanelService::new(config).unwrap();
        let (mut oven_io, mut panel_io) = (Side::default(), Side::default());
        oven.start(&mut oven_io).unwrap();
        panel.start(&mut panel_io).unwrap();
        settle(&mut oven, &mut oven_io, &mut panel, &mut panel_io);

        for step in steps {
            match step {
                Step::Press(signal) => panel.press(signal, &mut panel_io).unwrap(),
                Step::Wait(ms) => {
                    for _ in 0..ms / 100 {
                        oven.advance(100, &mut oven_io).unwrap();
                        panel.advance(100, &mut panel_io).unwrap();
                        settle(&mut oven, &mut oven_io, &mut panel, &mut panel_io);
                    }
                }
            }
            settle(&mut oven, &mut oven_io, &mut panel, &mut panel_io);

            prop_assert_eq!(panel.identity(), oven.identity());
            prop_assert!(oven.clock().is_valid_clock());
            prop_assert!(oven.proposed_clock().is_valid_clock());
            if oven.identity() == StateCode::DisplayClock {
                prop_assert_eq!(panel.clock(), oven.clock());
            }
        }
    }
}
