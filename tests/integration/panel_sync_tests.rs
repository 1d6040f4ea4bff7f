//! Panel synchronization: late start, link loss, noisy streams and the
//! transport adapter.

use std::collections::VecDeque;

use crate::mock_io::{Bench, MockSide, Screen};
use ovenpanel::app::ports::{DisplayPort, FrameSink};
use ovenpanel::app::transport::{Transport, TransportLink};
use ovenpanel::codec::{Destination, Frame, SignalCode, StateCode, legacy};
use ovenpanel::config::OvenConfig;
use ovenpanel::panel::{PanelService, PanelState};
use ovenpanel::time::{DigitPosition, Time};

#[test]
fn panel_polls_until_the_oven_comes_up() {
    let mut bench = Bench::unstarted(OvenConfig::default());
    bench.panel.start(&mut bench.panel_io).unwrap();
    assert_eq!(bench.panel_text(), "     ");

    // Nobody is listening yet.
    bench.panel.advance(2000, &mut bench.panel_io).unwrap();
    let polls = bench
        .panel_io
        .sent
        .iter()
        .filter(|f| f.code == ovenpanel::codec::Code::Signal(SignalCode::StateRequest))
        .count();
    assert_eq!(polls, 5);
    bench.panel_io.wire.clear();

    bench.oven.start(&mut bench.oven_io).unwrap();
    bench.pump();
    assert!(bench.panel.is_synchronized());
    assert_eq!(bench.panel.state(), Some(PanelState::ClockIdle));
}

#[test]
fn reconnect_picks_up_where_the_oven_is() {
    let mut bench = Bench::new();
    bench.press(SignalCode::CookTime);
    bench.digits(&[4, 5]);

    bench.link_up = false;
    bench.press(SignalCode::PowerLevel);
    bench.panel.disconnected(&mut bench.panel_io).unwrap();
    bench.pump();
    assert_eq!(bench.panel.state(), Some(PanelState::Connecting));

    bench.link_up = true;
    bench.advance(500);
    assert_eq!(bench.panel.state(), Some(PanelState::SetCookTimer));
    assert_eq!(bench.panel.timer(), Time::new(0, 0, 4, 5));
    assert_eq!(bench.panel_text(), "00:45");
}

#[test]
fn garbage_and_split_frames_are_tolerated() {
    let mut panel = PanelService::new(OvenConfig::default()).unwrap();
    let mut io = MockSide::new();
    panel.start(&mut io).unwrap();

    let paused = Frame::state_time(
        Destination::App,
        StateCode::DisplayTimerPaused,
        &Time::new(0, 2, 0, 0),
    );
    let mut bytes = vec![0x13, 0x37, b'M', b'p', 0xFF];
    bytes.extend_from_slice(&paused.encode());
    // A frame for the oven on the same wire is skipped.
    bytes.extend_from_slice(&Frame::signal(Destination::Dev, SignalCode::Stop).encode());

    let (head, tail) = bytes.split_at(11);
    panel.receive_bytes(head, &mut io).unwrap();
    assert_eq!(panel.state(), Some(PanelState::Connecting));
    panel.receive_bytes(tail, &mut io).unwrap();
    assert_eq!(panel.state(), Some(PanelState::TimerPaused));
    assert_eq!(io.screen.text(), "02:00");
}

#[test]
fn legacy_updates_refresh_the_view() {
    let mut panel = PanelService::new(OvenConfig::default()).unwrap();
    let mut io = MockSide::new();
    panel.start(&mut io).unwrap();
    let state = Frame::state_time(Destination::App, StateCode::DisplayClock, &Time::ZERO);
    panel.receive_datagram(&state.encode(), &mut io).unwrap();

    let mut msg = legacy::word::CURRENT_CLOCK.to_le_bytes().to_vec();
    msg.extend_from_slice(&Time::new(0, 7, 1, 5).to_raw());
    panel.receive_legacy(&msg, &mut io).unwrap();
    assert_eq!(panel.clock(), Time::new(0, 7, 1, 5));
    assert_eq!(io.screen.text(), "07:15");

    // Malformed input is dropped without touching the view.
    panel.receive_legacy(&[1, 2], &mut io).unwrap();
    assert_eq!(io.screen.text(), "07:15");
}

// ── Through the transport adapter ─────────────────────────────

/// One direction of an in-memory byte pipe.
#[derive(Default)]
struct Pipe {
    bytes: VecDeque<u8>,
}

impl Transport for Pipe {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let n = buf.len().min(self.bytes.len());
        for (dst, src) in buf.iter_mut().zip(self.bytes.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.bytes.extend(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.bytes.is_empty()
    }
}

/// A display plus an outgoing transport link.
struct Wired {
    link: TransportLink<Pipe>,
    screen: MockSide,
}

impl FrameSink for Wired {
    fn send(&mut self, frame: &Frame) {
        self.link.send(frame);
    }
}

impl DisplayPort for Wired {
    fn set_digit(&mut self, pos: DigitPosition, digit: Option<u8>) {
        self.screen.set_digit(pos, digit);
    }

    fn set_colon(&mut self, on: bool) {
        self.screen.set_colon(on);
    }

    fn set_power_display(&mut self, level: u8) {
        self.screen.set_power_display(level);
    }
}

#[test]
fn services_talk_over_a_transport_link() {
    let config = OvenConfig::default();
    let mut oven = ovenpanel::oven::OvenService::new(config.clone()).unwrap();
    let mut panel = PanelService::new(config).unwrap();

    // Each side writes into its own pipe and reads the other's.
    let mut oven_io = Wired {
        link: TransportLink::new(Pipe::default(), Destination::Dev),
        screen: MockSide::new(),
    };
    let mut panel_io = Wired {
        link: TransportLink::new(Pipe::default(), Destination::App),
        screen: MockSide::new(),
    };

    oven.start(&mut oven_io).unwrap();
    panel.start(&mut panel_io).unwrap();
    panel.press(SignalCode::KitchenTimer, &mut panel_io).unwrap();

    for _ in 0..4 {
        let mut to_panel = Vec::new();
        while let Some(b) = oven_io.link.transport_mut().bytes.pop_front() {
            to_panel.push(b);
        }
        let mut rx = TransportLink::new(Pipe::default(), Destination::App);
        rx.transport_mut().bytes.extend(to_panel);
        let mut frames = Vec::new();
        rx.poll(|f| frames.push(f));
        for f in &frames {
            panel.handle_frame(f, &mut panel_io).unwrap();
        }

        let mut to_oven = Vec::new();
        while let Some(b) = panel_io.link.transport_mut().bytes.pop_front() {
            to_oven.push(b);
        }
        oven.receive_bytes(&to_oven, &mut oven_io).unwrap();
    }

    assert_eq!(panel.state(), Some(PanelState::KitchenMinuteTens));
    assert_eq!(oven_io.link.write_errors(), 0);
    assert_eq!(panel_io.screen.screen, Screen {
        digits: [Some(0); 4],
        colon: true,
        power: None,
    });
}
