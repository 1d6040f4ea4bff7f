//! End-to-end scenarios: buttons pressed on the panel drive the oven over
//! the wire, and both displays end up showing the same thing.

use crate::mock_io::Bench;
use ovenpanel::codec::StateCode;
use ovenpanel::oven::OvenState;
use ovenpanel::panel::PanelState;
use ovenpanel::time::Time;

use ovenpanel::codec::SignalCode as Sig;

#[test]
fn power_up_shows_midnight_on_both_sides() {
    let bench = Bench::new();
    assert_eq!(bench.oven.state(), Some(OvenState::ClockIdle));
    assert_eq!(bench.panel.state(), Some(PanelState::ClockIdle));
    assert_eq!(bench.panel_text(), "00:00");
    assert_eq!(bench.oven_text(), "00:00");
}

#[test]
fn set_clock_from_the_panel() {
    let mut bench = Bench::new();
    bench.press(Sig::Clock);
    assert_eq!(bench.panel.state(), Some(PanelState::ClockHourTens));

    bench.digits(&[1, 2, 3, 4]);
    assert_eq!(bench.oven.proposed_clock(), Time::new(1, 2, 3, 4));
    assert_eq!(bench.panel.state(), Some(PanelState::ClockHourTens));
    assert_eq!(bench.panel.clock(), Time::new(1, 2, 3, 4));

    bench.press(Sig::Clock);
    assert_eq!(bench.oven.clock(), Time::new(1, 2, 3, 4));
    assert_eq!(bench.panel.state(), Some(PanelState::ClockIdle));
    assert_eq!(bench.panel_text(), "12:34");
}

#[test]
fn clock_keeps_time_and_panel_follows() {
    let mut bench = Bench::new();
    bench.press(Sig::Clock);
    bench.digits(&[0, 9, 5, 9]);
    bench.press(Sig::Clock);

    bench.advance(60_000);
    assert_eq!(bench.oven.clock(), Time::new(1, 0, 0, 0));
    assert_eq!(bench.panel.clock(), Time::new(1, 0, 0, 0));
    assert_eq!(&bench.panel_text()[..2], "10");
}

#[test]
fn clock_field_blinks_on_the_panel() {
    let mut bench = Bench::new();
    bench.press(Sig::Clock);
    bench.press(Sig::ModRightTens);
    assert_eq!(bench.panel.state(), Some(PanelState::ClockMinuteTens));
    assert_eq!(bench.panel_text(), "00:00");

    bench.advance(500);
    assert_eq!(bench.panel_text(), "00: 0");
    bench.advance(500);
    assert_eq!(bench.panel_text(), "00:00");
}

#[test]
fn idle_colon_blinks_on_both_sides() {
    let mut bench = Bench::new();
    bench.advance(500);
    assert_eq!(bench.oven_text(), "00 00");
    assert_eq!(bench.panel_text(), "00 00");
    bench.advance(500);
    assert_eq!(bench.panel_text(), "00:00");
}

#[test]
fn cook_program_runs_to_completion() {
    let mut bench = Bench::new();
    bench.press(Sig::CookTime);
    assert_eq!(bench.panel.identity(), StateCode::SetCookTimer);
    bench.digits(&[1, 0]);
    assert_eq!(bench.panel_text(), "00:10");

    bench.press(Sig::Start);
    assert_eq!(bench.panel.state(), Some(PanelState::TimerRunning));

    bench.advance(3000);
    assert_eq!(bench.panel.timer(), Time::new(0, 0, 0, 7));
    assert_eq!(bench.panel_text(), "00:07");

    bench.advance(7000);
    assert_eq!(bench.oven.state(), Some(OvenState::ClockIdle));
    assert_eq!(bench.panel.state(), Some(PanelState::ClockIdle));
}

#[test]
fn two_stage_program_switches_power() {
    let mut bench = Bench::new();
    bench.press(Sig::CookTime);
    bench.digits(&[2]);
    bench.press(Sig::PowerLevel);
    assert_eq!(bench.panel.state(), Some(PanelState::SetPowerLevel));
    bench.digits(&[5]);
    assert_eq!(bench.panel.power_level(), 5);
    assert_eq!(bench.panel_io.screen.power, Some(5));

    bench.press(Sig::CookTime);
    bench.digits(&[3]);
    bench.press(Sig::Start);
    assert_eq!(bench.oven.cook_index(), 0);

    bench.advance(2000);
    assert_eq!(bench.oven.cook_index(), 1);
    assert!(bench.panel.is_in(PanelState::DisplayTimer));
    assert_eq!(bench.panel.timer(), Time::new(0, 0, 0, 3));

    bench.advance(3000);
    assert_eq!(bench.panel.state(), Some(PanelState::ClockIdle));
}

#[test]
fn pause_resume_and_cancel() {
    let mut bench = Bench::new();
    bench.press(Sig::Start);
    assert_eq!(bench.panel_text(), "00:30");

    bench.press(Sig::Stop);
    assert_eq!(bench.panel.state(), Some(PanelState::TimerPaused));
    bench.advance(5000);
    assert_eq!(bench.panel_text(), "00:30");

    bench.press(Sig::Start);
    bench.advance(1000);
    assert_eq!(bench.panel_text(), "00:29");

    bench.press_all(&[Sig::Stop, Sig::Stop]);
    assert_eq!(bench.panel.state(), Some(PanelState::ClockIdle));
}

#[test]
fn power_button_during_countdown_flashes_level() {
    let mut bench = Bench::new();
    bench.press(Sig::Start);
    bench.press(Sig::PowerLevel);
    assert_eq!(bench.oven.state(), Some(OvenState::TimerRunning));
    assert_eq!(bench.panel_io.screen.power, Some(10));

    bench.advance(2000);
    assert_eq!(bench.panel_io.screen.power, None);
    assert_eq!(bench.panel.state(), Some(PanelState::TimerRunning));
}

#[test]
fn kitchen_timer_counts_down() {
    let mut bench = Bench::new();
    bench.press(Sig::KitchenTimer);
    assert_eq!(bench.panel.state(), Some(PanelState::KitchenMinuteTens));

    bench.digits(&[0, 1, 3, 0]);
    assert_eq!(bench.panel.state(), Some(PanelState::KitchenMinuteTens));
    assert_eq!(bench.panel.timer(), Time::new(0, 1, 3, 0));

    bench.press(Sig::Start);
    bench.advance(1000);
    assert_eq!(bench.panel_text(), "01:29");
}

#[test]
fn rejected_digit_changes_nothing_anywhere() {
    let mut bench = Bench::new();
    bench.press(Sig::Clock);
    bench.digits(&[2]);
    assert_eq!(bench.oven.state(), Some(OvenState::ClockHourTens));
    assert_eq!(bench.panel.state(), Some(PanelState::ClockHourTens));
    assert_eq!(bench.oven.proposed_clock(), Time::ZERO);
}

#[test]
fn stop_abandons_clock_setting() {
    let mut bench = Bench::new();
    bench.press(Sig::Clock);
    bench.digits(&[1, 1]);
    bench.press(Sig::Stop);
    assert_eq!(bench.oven.clock(), Time::ZERO);
    assert_eq!(bench.panel.state(), Some(PanelState::ClockIdle));
    assert_eq!(bench.panel_text(), "00:00");
}
