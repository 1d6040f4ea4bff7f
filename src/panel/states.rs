//! Panel state table.
//!
//! The panel follows the oven.  Until the oven answers it polls with
//! STATE_REQUEST; afterwards every STATE frame moves it straight to the
//! matching state, however deep, and every UPDATE frame redraws the view.
//!
//! ```text
//!  Panel ─┬─ Connecting*
//!         ├─ DisplayClock ─┬─ ClockIdle*
//!         │                └─ SetClock ── HourTens* │ HourOnes │ MinuteTens │ MinuteOnes
//!         ├─ SetCookTimer
//!         ├─ SetPowerLevel
//!         ├─ SetKitchenTimer ── MinuteTens* │ MinuteOnes │ SecondTens │ SecondOnes
//!         └─ DisplayTimer ─┬─ TimerRunning*
//!                          └─ TimerPaused
//! ```

use log::{debug, info};

use crate::codec::{SignalCode, StateCode, UpdateCode};
use crate::error::HfsmError;
use crate::hfsm::{Hfsm, StateDescriptor, Transition, TransitionSwitch};
use crate::time::DigitPosition;
use crate::timers::{TimerId, TimerMode};

use super::context::{PanelContext, View};
use super::{PanelEvent, PanelState as S, PanelTrigger as T};

type Panel = Hfsm<S, PanelContext, PanelEvent>;
type Tr = Transition<S, PanelContext, PanelEvent>;
type Sd = StateDescriptor<S, PanelContext>;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the panel's state table.
pub fn build_machine() -> Result<Panel, HfsmError> {
    let mut b = Panel::builder();

    b.state(Sd::root(S::Panel, S::Connecting))
        .state(
            Sd::leaf(S::Connecting, S::Panel)
                .on_enter(connecting_enter)
                .on_exit(connecting_exit),
        )
        .state(Sd::composite(S::DisplayClock, S::Panel, S::ClockIdle))
        .state(Sd::leaf(S::ClockIdle, S::DisplayClock).on_enter(clock_idle_enter))
        .state(Sd::composite(S::SetClock, S::DisplayClock, S::ClockHourTens))
        .state(Sd::leaf(S::ClockHourTens, S::SetClock).on_enter(clock_hour_tens_enter))
        .state(Sd::leaf(S::ClockHourOnes, S::SetClock).on_enter(clock_hour_ones_enter))
        .state(Sd::leaf(S::ClockMinuteTens, S::SetClock).on_enter(clock_minute_tens_enter))
        .state(Sd::leaf(S::ClockMinuteOnes, S::SetClock).on_enter(clock_minute_ones_enter))
        .state(Sd::leaf(S::SetCookTimer, S::Panel).on_enter(set_cook_timer_enter))
        .state(Sd::leaf(S::SetPowerLevel, S::Panel).on_enter(set_power_level_enter))
        .state(Sd::composite(S::SetKitchenTimer, S::Panel, S::KitchenMinuteTens))
        .state(Sd::leaf(S::KitchenMinuteTens, S::SetKitchenTimer).on_enter(kitchen_minute_tens_enter))
        .state(Sd::leaf(S::KitchenMinuteOnes, S::SetKitchenTimer).on_enter(kitchen_minute_ones_enter))
        .state(Sd::leaf(S::KitchenSecondTens, S::SetKitchenTimer).on_enter(kitchen_second_tens_enter))
        .state(Sd::leaf(S::KitchenSecondOnes, S::SetKitchenTimer).on_enter(kitchen_second_ones_enter))
        .state(Sd::composite(S::DisplayTimer, S::Panel, S::TimerRunning).on_exit(display_timer_exit))
        .state(Sd::leaf(S::TimerRunning, S::DisplayTimer).on_enter(timer_running_enter))
        .state(Sd::leaf(S::TimerPaused, S::DisplayTimer).on_enter(timer_paused_enter));

    // ── Root: buttons, resync jumps, updates ──────────────────
    b.transition(Tr::internal(S::Panel, T::Press).effect(forward_press));
    b.transition(Tr::external(S::Panel, T::Disconnected, S::Connecting));

    b.transition(jump(S::ClockIdle).guard(announces::<{ StateCode::DisplayClock.raw() }>));
    b.transition(jump(S::ClockHourTens).guard(announces::<{ StateCode::ClockSelectHourTens.raw() }>));
    b.transition(jump(S::ClockHourOnes).guard(announces::<{ StateCode::ClockSelectHourOnes.raw() }>));
    b.transition(jump(S::ClockMinuteTens).guard(announces::<{ StateCode::ClockSelectMinuteTens.raw() }>));
    b.transition(jump(S::ClockMinuteOnes).guard(announces::<{ StateCode::ClockSelectMinuteOnes.raw() }>));
    b.transition(jump(S::SetCookTimer).guard(announces::<{ StateCode::SetCookTimer.raw() }>));
    b.transition(jump(S::SetPowerLevel).guard(announces::<{ StateCode::SetPowerLevel.raw() }>));
    b.transition(jump(S::KitchenMinuteTens).guard(announces::<{ StateCode::KitchenSelectMinuteTens.raw() }>));
    b.transition(jump(S::KitchenMinuteOnes).guard(announces::<{ StateCode::KitchenSelectMinuteOnes.raw() }>));
    b.transition(jump(S::KitchenSecondTens).guard(announces::<{ StateCode::KitchenSelectSecondTens.raw() }>));
    b.transition(jump(S::KitchenSecondOnes).guard(announces::<{ StateCode::KitchenSelectSecondOnes.raw() }>));
    b.transition(jump(S::TimerRunning).guard(announces::<{ StateCode::DisplayTimer.raw() }>));
    b.transition(jump(S::TimerPaused).guard(announces::<{ StateCode::DisplayTimerPaused.raw() }>));
    // Already there: just take the value.
    b.transition(Tr::internal(S::Panel, T::State).effect(refresh_state_value));

    b.transition(Tr::internal(S::Panel, T::Update).effect(apply_update));
    b.transition(Tr::internal(S::Panel, T::Blink).effect(apply_blink));

    // ── Connecting ────────────────────────────────────────────
    b.transition(Tr::internal(S::Connecting, T::StateRequestTick).effect(request_state));

    // ── DisplayTimer: power flash ─────────────────────────────
    b.transition(
        Tr::internal(S::DisplayTimer, T::Update)
            .guard(is_power_update)
            .effect(flash_power),
    );
    b.transition(Tr::internal(S::DisplayTimer, T::PowerFlashDone).effect(end_power_flash));

    b.build()
}

fn jump(target: S) -> Tr {
    Tr::external(S::Panel, T::State, target).effect(store_state_value)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Root handlers
// ═══════════════════════════════════════════════════════════════════════════

fn forward_press(ctx: &mut PanelContext, event: &PanelEvent) {
    if let PanelEvent::Press(signal) = *event {
        ctx.send(signal);
    }
}

/// A STATE frame for `RAW` that the panel is not already mirroring.
fn announces<const RAW: u32>(ctx: &PanelContext, event: &PanelEvent) -> bool {
    matches!(event, PanelEvent::State { code, .. } if code.raw() == RAW)
        && ctx.identity.raw() != RAW
}

/// Take the value a STATE frame carries before the target state draws it.
fn store_state_value(ctx: &mut PanelContext, event: &PanelEvent) {
    let PanelEvent::State { code, payload } = *event else {
        return;
    };
    let frame = super::state_frame(code, payload);
    match code {
        StateCode::None => {}
        StateCode::SetPowerLevel => {
            if let Some(level) = frame.raw_power() {
                ctx.power_level = level;
            }
        }
        StateCode::DisplayClock
        | StateCode::ClockSelectHourTens
        | StateCode::ClockSelectHourOnes
        | StateCode::ClockSelectMinuteTens
        | StateCode::ClockSelectMinuteOnes => {
            if let Some(t) = frame.raw_time() {
                ctx.clock = t;
            }
        }
        _ => {
            if let Some(t) = frame.raw_time() {
                ctx.timer = t;
            }
        }
    }
}

fn refresh_state_value(ctx: &mut PanelContext, event: &PanelEvent) {
    store_state_value(ctx, event);
    ctx.render();
}

fn apply_update(ctx: &mut PanelContext, event: &PanelEvent) {
    let PanelEvent::Update { code, payload } = *event else {
        return;
    };
    let frame = super::update_frame(code, payload);
    let shown = match code {
        UpdateCode::Clock => frame.ascii_time().map(|t| {
            ctx.clock = t;
            View::Clock
        }),
        UpdateCode::DisplayTimer => frame.ascii_time().map(|t| {
            ctx.timer = t;
            View::Timer
        }),
        UpdateCode::PowerLevel => frame.ascii_power().map(|p| {
            ctx.power_level = p;
            View::Power
        }),
        UpdateCode::None => None,
    };
    if shown == Some(ctx.view) {
        ctx.render();
    }
}

fn apply_blink(ctx: &mut PanelContext, event: &PanelEvent) {
    if let PanelEvent::Blink(on) = *event {
        ctx.blink_on = on;
        if matches!(ctx.view, View::Clock | View::Timer) {
            ctx.render();
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Connecting
// ═══════════════════════════════════════════════════════════════════════════

fn connecting_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    info!("PANEL: waiting for oven state");
    ctx.show(StateCode::None, View::Blank, None);
    ctx.send(SignalCode::StateRequest);
    ctx.start_timer(TimerId::StateRequest, TimerMode::Periodic);
}

fn connecting_exit(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.timers.stop(TimerId::StateRequest);
    info!("PANEL: synchronized with oven");
}

fn request_state(ctx: &mut PanelContext, _: &PanelEvent) {
    debug!("PANEL: polling oven state");
    ctx.send(SignalCode::StateRequest);
}

// ═══════════════════════════════════════════════════════════════════════════
//  Views
// ═══════════════════════════════════════════════════════════════════════════

fn clock_idle_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::DisplayClock, View::Clock, None);
}

fn clock_hour_tens_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::ClockSelectHourTens, View::Clock, Some(DigitPosition::LeftTens));
}

fn clock_hour_ones_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::ClockSelectHourOnes, View::Clock, Some(DigitPosition::LeftOnes));
}

fn clock_minute_tens_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::ClockSelectMinuteTens, View::Clock, Some(DigitPosition::RightTens));
}

fn clock_minute_ones_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::ClockSelectMinuteOnes, View::Clock, Some(DigitPosition::RightOnes));
}

fn set_cook_timer_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::SetCookTimer, View::Timer, None);
}

fn set_power_level_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::SetPowerLevel, View::Power, None);
}

fn kitchen_minute_tens_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::KitchenSelectMinuteTens, View::Timer, Some(DigitPosition::LeftTens));
}

fn kitchen_minute_ones_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::KitchenSelectMinuteOnes, View::Timer, Some(DigitPosition::LeftOnes));
}

fn kitchen_second_tens_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::KitchenSelectSecondTens, View::Timer, Some(DigitPosition::RightTens));
}

fn kitchen_second_ones_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::KitchenSelectSecondOnes, View::Timer, Some(DigitPosition::RightOnes));
}

fn timer_running_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::DisplayTimer, View::Timer, None);
}

fn timer_paused_enter(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.show(StateCode::DisplayTimerPaused, View::Timer, None);
}

fn display_timer_exit(ctx: &mut PanelContext, _: &mut TransitionSwitch<'_>) {
    ctx.timers.stop(TimerId::PowerFlash);
    ctx.flashing_power = false;
}

// ── Power flash over the countdown ───────────────────────────────────────

fn is_power_update(_: &PanelContext, event: &PanelEvent) -> bool {
    matches!(
        event,
        PanelEvent::Update {
            code: UpdateCode::PowerLevel,
            ..
        }
    )
}

fn flash_power(ctx: &mut PanelContext, event: &PanelEvent) {
    let PanelEvent::Update { code, payload } = *event else {
        return;
    };
    if let Some(level) = super::update_frame(code, payload).ascii_power() {
        ctx.power_level = level;
    }
    ctx.flashing_power = true;
    ctx.start_timer(TimerId::PowerFlash, TimerMode::OneShot);
    ctx.render();
}

fn end_power_flash(ctx: &mut PanelContext, _: &PanelEvent) {
    ctx.flashing_power = false;
    ctx.render();
}
