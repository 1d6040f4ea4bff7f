//! Oven state table: hierarchy, transitions, and handler functions.
//!
//! Every handler is a plain `fn` over [`OvenContext`]; nothing here knows
//! about ports or the engine beyond the [`TransitionSwitch`].
//!
//! ```text
//!  Oven ─┬─ DisplayClock ─┬─ ClockIdle*
//!        │                └─ SetClock ── HourTens* → HourOnes → MinuteTens → MinuteOnes ↺
//!        ├─ SetCookTime ── CookTimeInitial*
//!        ├─ SetPowerLevel
//!        ├─ SetKitchenTimer ── MinuteTens* → MinuteOnes → SecondTens → SecondOnes ↺
//!        └─ DisplayTimer ─┬─ TimerRunning*
//!                         └─ TimerPaused
//! ```
//! (`*` = initial child)

use heapless::Vec;
use log::{debug, info, warn};

use crate::app::ports::DisplayCommand;
use crate::codec::{SignalCode, StateCode};
use crate::error::HfsmError;
use crate::hfsm::{Hfsm, StateDescriptor, Transition, TransitionId, TransitionSwitch};
use crate::time::{DigitPosition, clock_digit_allowed, countdown_digit_allowed};
use crate::timers::{TimerId, TimerMode};

use super::context::{EditMode, OvenContext};
use super::{OvenEvent, OvenState as S, OvenTrigger as T};

type Oven = Hfsm<S, OvenContext, OvenEvent>;
type Tr = Transition<S, OvenContext, OvenEvent>;
type Sd = StateDescriptor<S, OvenContext>;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the oven machine.  Also returns the DisplayClock transitions that
/// are disabled while the clock is being set.
pub fn build_machine() -> Result<(Oven, Vec<TransitionId, 4>), HfsmError> {
    let mut b = Oven::builder();

    b.state(Sd::root(S::Oven, S::DisplayClock).on_enter(oven_enter))
        // Clock display and clock setting
        .state(
            Sd::composite(S::DisplayClock, S::Oven, S::ClockIdle)
                .on_enter(display_clock_enter)
                .on_exit(display_clock_exit),
        )
        .state(Sd::leaf(S::ClockIdle, S::DisplayClock).on_enter(clock_idle_enter))
        .state(
            Sd::composite(S::SetClock, S::DisplayClock, S::ClockHourTens)
                .on_enter(set_clock_enter)
                .on_exit(set_clock_exit),
        )
        .state(Sd::leaf(S::ClockHourTens, S::SetClock).on_enter(clock_hour_tens_enter))
        .state(Sd::leaf(S::ClockHourOnes, S::SetClock).on_enter(clock_hour_ones_enter))
        .state(Sd::leaf(S::ClockMinuteTens, S::SetClock).on_enter(clock_minute_tens_enter))
        .state(Sd::leaf(S::ClockMinuteOnes, S::SetClock).on_enter(clock_minute_ones_enter))
        // Cook program entry
        .state(
            Sd::composite(S::SetCookTime, S::Oven, S::CookTimeInitial)
                .on_enter(set_cook_time_enter),
        )
        .state(Sd::leaf(S::CookTimeInitial, S::SetCookTime).on_enter(cook_time_initial_enter))
        .state(Sd::leaf(S::SetPowerLevel, S::Oven).on_enter(set_power_level_enter))
        // Kitchen timer entry
        .state(
            Sd::composite(S::SetKitchenTimer, S::Oven, S::KitchenMinuteTens)
                .on_enter(set_kitchen_enter)
                .on_exit(stop_blink),
        )
        .state(Sd::leaf(S::KitchenMinuteTens, S::SetKitchenTimer).on_enter(kitchen_minute_tens_enter))
        .state(Sd::leaf(S::KitchenMinuteOnes, S::SetKitchenTimer).on_enter(kitchen_minute_ones_enter))
        .state(Sd::leaf(S::KitchenSecondTens, S::SetKitchenTimer).on_enter(kitchen_second_tens_enter))
        .state(Sd::leaf(S::KitchenSecondOnes, S::SetKitchenTimer).on_enter(kitchen_second_ones_enter))
        // Countdown
        .state(
            Sd::composite(S::DisplayTimer, S::Oven, S::TimerRunning)
                .on_enter(display_timer_enter),
        )
        .state(
            Sd::leaf(S::TimerRunning, S::DisplayTimer)
                .on_enter(timer_running_enter)
                .on_exit(timer_running_exit),
        )
        .state(Sd::leaf(S::TimerPaused, S::DisplayTimer).on_enter(timer_paused_enter));

    // ── Root ──────────────────────────────────────────────────
    b.transition(Tr::internal(S::Oven, T::StateRequest).effect(resync));
    b.transition(Tr::internal(S::Oven, T::ClockTick).effect(advance_clock));

    // ── DisplayClock (locked while SetClock is active) ────────
    let mut lock = Vec::new();
    for t in [
        Tr::external(S::DisplayClock, T::CookTime, S::SetCookTime),
        Tr::external(S::DisplayClock, T::PowerLevel, S::SetPowerLevel),
        Tr::external(S::DisplayClock, T::KitchenTimer, S::SetKitchenTimer),
        Tr::external(S::DisplayClock, T::Start, S::DisplayTimer).effect(quick_start),
    ] {
        lock.push(b.transition(t)).map_err(|_| HfsmError::CapacityExceeded)?;
    }

    b.transition(Tr::external(S::ClockIdle, T::Clock, S::SetClock));
    b.transition(Tr::internal(S::ClockIdle, T::BlinkTick).effect(blink_colon));

    // ── SetClock ──────────────────────────────────────────────
    b.transition(Tr::external(S::SetClock, T::Clock, S::DisplayClock).effect(accept_clock));
    b.transition(Tr::external(S::SetClock, T::Stop, S::DisplayClock).effect(decline_clock));
    b.transition(Tr::external(S::SetClock, T::Select, S::ClockHourTens).guard(selects_left_tens));
    b.transition(Tr::external(S::SetClock, T::Select, S::ClockHourOnes).guard(selects_left_ones));
    b.transition(Tr::external(S::SetClock, T::Select, S::ClockMinuteTens).guard(selects_right_tens));
    b.transition(Tr::external(S::SetClock, T::Select, S::ClockMinuteOnes).guard(selects_right_ones));
    b.transition(Tr::internal(S::SetClock, T::BlinkTick).effect(blink_clock_field));

    for (from, to) in [
        (S::ClockHourTens, S::ClockHourOnes),
        (S::ClockHourOnes, S::ClockMinuteTens),
        (S::ClockMinuteTens, S::ClockMinuteOnes),
        (S::ClockMinuteOnes, S::ClockHourTens),
    ] {
        b.transition(
            Tr::external(from, T::Digit, to)
                .guard(clock_digit_ok)
                .effect(store_clock_digit),
        );
        b.transition(Tr::external(from, T::NextDigit, to));
    }

    // ── SetCookTime ───────────────────────────────────────────
    b.transition(Tr::external(S::SetCookTime, T::PowerLevel, S::SetPowerLevel));
    b.transition(Tr::external(S::SetCookTime, T::Start, S::DisplayTimer));
    b.transition(Tr::external(S::SetCookTime, T::Stop, S::DisplayClock));
    b.transition(
        Tr::internal(S::CookTimeInitial, T::Digit)
            .guard(is_digit)
            .effect(shift_cook_digit),
    );

    // ── SetPowerLevel ─────────────────────────────────────────
    b.transition(Tr::external(S::SetPowerLevel, T::CookTime, S::SetCookTime));
    b.transition(Tr::external(S::SetPowerLevel, T::Start, S::DisplayTimer));
    b.transition(Tr::external(S::SetPowerLevel, T::Stop, S::DisplayClock));
    b.transition(
        Tr::internal(S::SetPowerLevel, T::Digit)
            .guard(is_digit)
            .effect(store_power_digit),
    );

    // ── SetKitchenTimer ───────────────────────────────────────
    b.transition(Tr::external(S::SetKitchenTimer, T::Start, S::DisplayTimer));
    b.transition(Tr::external(S::SetKitchenTimer, T::Stop, S::DisplayClock));
    b.transition(Tr::external(S::SetKitchenTimer, T::Select, S::KitchenMinuteTens).guard(selects_left_tens));
    b.transition(Tr::external(S::SetKitchenTimer, T::Select, S::KitchenMinuteOnes).guard(selects_left_ones));
    b.transition(Tr::external(S::SetKitchenTimer, T::Select, S::KitchenSecondTens).guard(selects_right_tens));
    b.transition(Tr::external(S::SetKitchenTimer, T::Select, S::KitchenSecondOnes).guard(selects_right_ones));
    b.transition(Tr::internal(S::SetKitchenTimer, T::BlinkTick).effect(blink_kitchen_field));

    for (from, to) in [
        (S::KitchenMinuteTens, S::KitchenMinuteOnes),
        (S::KitchenMinuteOnes, S::KitchenSecondTens),
        (S::KitchenSecondTens, S::KitchenSecondOnes),
        (S::KitchenSecondOnes, S::KitchenMinuteTens),
    ] {
        b.transition(
            Tr::external(from, T::Digit, to)
                .guard(kitchen_digit_ok)
                .effect(store_kitchen_digit),
        );
        b.transition(Tr::external(from, T::NextDigit, to));
    }

    // ── DisplayTimer ──────────────────────────────────────────
    b.transition(Tr::external(S::DisplayTimer, T::DisplayTimerDone, S::DisplayClock));
    b.transition(Tr::internal(S::DisplayTimer, T::PowerLevel).effect(resend_power));
    b.transition(Tr::external(S::TimerRunning, T::Stop, S::TimerPaused));
    b.transition(Tr::internal(S::TimerRunning, T::CountdownTick).effect(count_down));
    b.transition(Tr::internal(S::TimerRunning, T::Start).effect(add_quick_seconds));
    b.transition(Tr::external(S::TimerPaused, T::Start, S::TimerRunning));
    b.transition(Tr::external(S::TimerPaused, T::Stop, S::DisplayClock));

    Ok((b.build()?, lock))
}

// ═══════════════════════════════════════════════════════════════════════════
//  Oven (root)
// ═══════════════════════════════════════════════════════════════════════════

fn oven_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    ctx.start_timer(TimerId::ClockMinute, TimerMode::Periodic);
    info!("OVEN: powered up, clock at {}", ctx.clock);
}

fn resync(ctx: &mut OvenContext, _: &OvenEvent) {
    debug!("OVEN: state request, announcing {:?}", ctx.identity);
    ctx.announce();
}

/// The clock keeps running while other modes are active; it is only
/// redrawn and pushed while it is on display.
fn advance_clock(ctx: &mut OvenContext, _: &OvenEvent) {
    ctx.clock.advance_minute();
    if ctx.identity == StateCode::DisplayClock {
        let clock = ctx.clock;
        ctx.outbox.show_time(&clock, ctx.blink_on);
        ctx.update_clock(clock);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DisplayClock / ClockIdle
// ═══════════════════════════════════════════════════════════════════════════

fn display_clock_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    ctx.blink_on = true;
    ctx.start_timer(TimerId::Blink, TimerMode::Periodic);
}

fn display_clock_exit(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    ctx.timers.stop(TimerId::Blink);
}

fn clock_idle_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    ctx.mode = EditMode::None;
    ctx.field = None;
    ctx.identity = StateCode::DisplayClock;
    let clock = ctx.clock;
    ctx.outbox.show_time(&clock, true);
    ctx.announce();
}

fn blink_colon(ctx: &mut OvenContext, _: &OvenEvent) {
    ctx.blink_on = !ctx.blink_on;
    ctx.outbox.display(DisplayCommand::Colon(ctx.blink_on));
    ctx.signal(blink_signal(ctx.blink_on));
}

/// START from the clock display: add the quick-start seconds to the active
/// stage and begin counting.
fn quick_start(ctx: &mut OvenContext, _: &OvenEvent) {
    let secs = ctx.config.quick_start_secs as u32;
    ctx.active_entry_mut().timer.add_seconds(secs);
    info!("OVEN: quick start, {}", ctx.active_entry().timer);
}

// ═══════════════════════════════════════════════════════════════════════════
//  SetClock
// ═══════════════════════════════════════════════════════════════════════════

fn set_clock_enter(ctx: &mut OvenContext, sw: &mut TransitionSwitch<'_>) {
    for id in &ctx.edit_lock {
        sw.disable(*id);
    }
    ctx.proposed = ctx.clock;
    ctx.mode = EditMode::SetClock;
}

fn set_clock_exit(ctx: &mut OvenContext, sw: &mut TransitionSwitch<'_>) {
    for id in &ctx.edit_lock {
        sw.enable(*id);
    }
}

fn enter_clock_field(ctx: &mut OvenContext, pos: DigitPosition, identity: StateCode) {
    ctx.field = Some(pos);
    ctx.blink_on = true;
    ctx.identity = identity;
    ctx.signal(SignalCode::select(pos));
    let proposed = ctx.proposed;
    ctx.show_editing(proposed);
    ctx.announce();
}

fn clock_hour_tens_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    enter_clock_field(ctx, DigitPosition::LeftTens, StateCode::ClockSelectHourTens);
}

fn clock_hour_ones_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    enter_clock_field(ctx, DigitPosition::LeftOnes, StateCode::ClockSelectHourOnes);
}

fn clock_minute_tens_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    enter_clock_field(ctx, DigitPosition::RightTens, StateCode::ClockSelectMinuteTens);
}

fn clock_minute_ones_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    enter_clock_field(ctx, DigitPosition::RightOnes, StateCode::ClockSelectMinuteOnes);
}

fn clock_digit_ok(ctx: &OvenContext, event: &OvenEvent) -> bool {
    match (ctx.field, event) {
        (Some(pos), OvenEvent::Digit(d)) => clock_digit_allowed(pos, &ctx.proposed, *d),
        _ => false,
    }
}

fn store_clock_digit(ctx: &mut OvenContext, event: &OvenEvent) {
    if let (Some(pos), OvenEvent::Digit(d)) = (ctx.field, event) {
        ctx.proposed.set_digit(pos, *d);
        let proposed = ctx.proposed;
        ctx.update_clock(proposed);
    }
}

fn accept_clock(ctx: &mut OvenContext, _: &OvenEvent) {
    if !ctx.proposed.is_valid_clock() {
        warn!("OVEN: refusing invalid clock {}", ctx.proposed);
        ctx.signal(SignalCode::Stop);
        return;
    }
    ctx.clock = ctx.proposed;
    // Seconds restart from zero at the new time.
    ctx.start_timer(TimerId::ClockMinute, TimerMode::Periodic);
    ctx.signal(SignalCode::Clock);
    info!("OVEN: clock set to {}", ctx.clock);
}

fn decline_clock(ctx: &mut OvenContext, _: &OvenEvent) {
    ctx.signal(SignalCode::Stop);
    info!("OVEN: clock setting abandoned");
}

fn blink_clock_field(ctx: &mut OvenContext, _: &OvenEvent) {
    ctx.blink_on = !ctx.blink_on;
    let proposed = ctx.proposed;
    ctx.show_editing(proposed);
    ctx.signal(blink_signal(ctx.blink_on));
}

// ── Field selection (shared by SetClock and SetKitchenTimer) ──────────────

fn selects(ctx: &OvenContext, event: &OvenEvent, pos: DigitPosition) -> bool {
    matches!(event, OvenEvent::Select(p) if *p == pos) && ctx.field != Some(pos)
}

fn selects_left_tens(ctx: &OvenContext, event: &OvenEvent) -> bool {
    selects(ctx, event, DigitPosition::LeftTens)
}

fn selects_left_ones(ctx: &OvenContext, event: &OvenEvent) -> bool {
    selects(ctx, event, DigitPosition::LeftOnes)
}

fn selects_right_tens(ctx: &OvenContext, event: &OvenEvent) -> bool {
    selects(ctx, event, DigitPosition::RightTens)
}

fn selects_right_ones(ctx: &OvenContext, event: &OvenEvent) -> bool {
    selects(ctx, event, DigitPosition::RightOnes)
}

fn blink_signal(on: bool) -> SignalCode {
    if on { SignalCode::BlinkOn } else { SignalCode::BlinkOff }
}

fn is_digit(_: &OvenContext, event: &OvenEvent) -> bool {
    matches!(event, OvenEvent::Digit(d) if *d <= 9)
}

// ═══════════════════════════════════════════════════════════════════════════
//  SetCookTime / SetPowerLevel
// ═══════════════════════════════════════════════════════════════════════════

/// Arriving from power-level entry edits the second stage; otherwise the
/// program starts over at stage 0.
fn set_cook_time_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    if ctx.mode == EditMode::SetPower {
        ctx.cook_index = 1;
    } else {
        ctx.reset_cook();
    }
    ctx.mode = EditMode::SetCook;
}

fn cook_time_initial_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    ctx.active_entry_mut().timer.clear();
    ctx.first_digit = true;
    ctx.field = None;
    ctx.identity = StateCode::SetCookTimer;
    let timer = ctx.active_entry().timer;
    ctx.outbox.show_time(&timer, true);
    ctx.announce();
}

fn shift_cook_digit(ctx: &mut OvenContext, event: &OvenEvent) {
    let OvenEvent::Digit(d) = *event else { return };
    if ctx.first_digit {
        if d != 0 {
            ctx.active_entry_mut().timer.right_ones = d;
            ctx.first_digit = false;
        }
    } else {
        ctx.active_entry_mut().timer.shift_in(d);
    }
    let timer = ctx.active_entry().timer;
    ctx.outbox.show_time(&timer, true);
    ctx.update_timer();
}

fn set_power_level_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    if ctx.mode != EditMode::SetCook {
        ctx.reset_cook();
    }
    let level = ctx.config.default_power_level;
    ctx.active_entry_mut().power_level = level;
    ctx.mode = EditMode::SetPower;
    ctx.field = None;
    ctx.identity = StateCode::SetPowerLevel;
    ctx.outbox.show_power(level);
    ctx.announce();
}

fn store_power_digit(ctx: &mut OvenContext, event: &OvenEvent) {
    let OvenEvent::Digit(d) = *event else { return };
    ctx.active_entry_mut().set_power_digit(d);
    let level = ctx.active_entry().power_level;
    ctx.outbox.show_power(level);
    ctx.update_power();
}

// ═══════════════════════════════════════════════════════════════════════════
//  SetKitchenTimer
// ═══════════════════════════════════════════════════════════════════════════

fn set_kitchen_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    ctx.reset_cook();
    ctx.mode = EditMode::SetKitchen;
    ctx.blink_on = true;
    ctx.start_timer(TimerId::Blink, TimerMode::Periodic);
}

fn stop_blink(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    ctx.timers.stop(TimerId::Blink);
}

fn enter_kitchen_field(ctx: &mut OvenContext, pos: DigitPosition, identity: StateCode) {
    ctx.field = Some(pos);
    ctx.blink_on = true;
    ctx.identity = identity;
    ctx.signal(SignalCode::select(pos));
    let timer = ctx.active_entry().timer;
    ctx.show_editing(timer);
    ctx.announce();
}

fn kitchen_minute_tens_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    enter_kitchen_field(ctx, DigitPosition::LeftTens, StateCode::KitchenSelectMinuteTens);
}

fn kitchen_minute_ones_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    enter_kitchen_field(ctx, DigitPosition::LeftOnes, StateCode::KitchenSelectMinuteOnes);
}

fn kitchen_second_tens_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    enter_kitchen_field(ctx, DigitPosition::RightTens, StateCode::KitchenSelectSecondTens);
}

fn kitchen_second_ones_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    enter_kitchen_field(ctx, DigitPosition::RightOnes, StateCode::KitchenSelectSecondOnes);
}

fn kitchen_digit_ok(ctx: &OvenContext, event: &OvenEvent) -> bool {
    match (ctx.field, event) {
        (Some(pos), OvenEvent::Digit(d)) => countdown_digit_allowed(pos, *d),
        _ => false,
    }
}

fn store_kitchen_digit(ctx: &mut OvenContext, event: &OvenEvent) {
    if let (Some(pos), OvenEvent::Digit(d)) = (ctx.field, event) {
        ctx.active_entry_mut().timer.set_digit(pos, *d);
        ctx.update_timer();
    }
}

fn blink_kitchen_field(ctx: &mut OvenContext, _: &OvenEvent) {
    ctx.blink_on = !ctx.blink_on;
    let timer = ctx.active_entry().timer;
    ctx.show_editing(timer);
    ctx.signal(blink_signal(ctx.blink_on));
}

// ═══════════════════════════════════════════════════════════════════════════
//  DisplayTimer
// ═══════════════════════════════════════════════════════════════════════════

/// Coming from an edit mode, counting starts at the first non-empty stage.
fn display_timer_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    if matches!(
        ctx.mode,
        EditMode::SetCook | EditMode::SetPower | EditMode::SetKitchen
    ) {
        ctx.cook_index = if ctx.cook[0].timer.is_zero() && !ctx.cook[1].timer.is_zero() {
            1
        } else {
            0
        };
    }
    ctx.mode = EditMode::Countdown;
    ctx.field = None;
    info!(
        "OVEN: countdown {} at power {}",
        ctx.active_entry().timer,
        ctx.active_entry().power_level
    );
}

fn timer_running_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    ctx.start_timer(TimerId::Countdown, TimerMode::Periodic);
    ctx.identity = StateCode::DisplayTimer;
    let timer = ctx.active_entry().timer;
    ctx.outbox.show_time(&timer, true);
    ctx.announce();
}

fn timer_running_exit(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    ctx.timers.stop(TimerId::Countdown);
}

fn timer_paused_enter(ctx: &mut OvenContext, _: &mut TransitionSwitch<'_>) {
    ctx.identity = StateCode::DisplayTimerPaused;
    ctx.announce();
}

fn count_down(ctx: &mut OvenContext, _: &OvenEvent) {
    let finished = ctx.active_entry_mut().timer.count_down();
    let timer = ctx.active_entry().timer;
    ctx.outbox.show_time(&timer, true);
    ctx.update_timer();

    if !finished {
        return;
    }
    let other = 1 - ctx.cook_index;
    ctx.cook_index = other;
    if ctx.cook[other].timer.is_zero() {
        info!("OVEN: countdown finished");
        ctx.raise(OvenEvent::DisplayTimerDone);
    } else {
        info!("OVEN: stage done, continuing with stage {}", other);
        ctx.announce();
        ctx.update_power();
    }
}

fn add_quick_seconds(ctx: &mut OvenContext, _: &OvenEvent) {
    let secs = ctx.config.quick_start_secs as u32;
    ctx.active_entry_mut().timer.add_seconds(secs);
    let timer = ctx.active_entry().timer;
    ctx.outbox.show_time(&timer, true);
    ctx.update_timer();
}

fn resend_power(ctx: &mut OvenContext, _: &OvenEvent) {
    ctx.update_power();
}
