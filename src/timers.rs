//! Software timer service.
//!
//! Timers are started and stopped by state entry/exit actions and advanced
//! by the owning service with the elapsed wall time.  Expiries are handed
//! out one at a time, in deadline order, so each expiry can be dispatched
//! (and may start or stop other timers) before the next one is considered:
//!
//! ```text
//!   advance(elapsed) ──▶ pop_expired(&mut budget) ──▶ dispatch event
//!          ▲                                              │
//!          └──────────── until budget exhausted ◀─────────┘
//! ```
//!
//! A timer stopped by an exit action is removed immediately and never
//! fires afterwards.

use core::fmt;

use log::{debug, warn};

/// Timers used by the oven and panel services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Advances the clock by one minute.
    ClockMinute,
    /// Toggles the blink phase of the colon or the edited field.
    Blink,
    /// Decrements the running countdown by one second.
    Countdown,
    /// Panel polls the oven for its state until it answers.
    StateRequest,
    /// Panel stops showing the power level during a countdown.
    PowerFlash,
}

/// Whether a timer re-arms after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Periodic,
    OneShot,
}

#[derive(Debug, Clone, Copy)]
struct TimerSlot<K> {
    key: K,
    period_ms: u32,
    remaining_ms: u32,
    mode: TimerMode,
}

/// Fixed-capacity set of named timers.
pub struct Timers<K, const N: usize> {
    slots: [Option<TimerSlot<K>>; N],
}

impl<K: Copy + Eq + fmt::Debug, const N: usize> Default for Timers<K, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + fmt::Debug, const N: usize> Timers<K, N> {
    /// A table with every slot free.
    pub fn new() -> Self {
        Self { slots: [None; N] }
    }

    /// Arm `key` to fire after `period_ms`.  Re-arms it if already running.
    /// Returns `false` if every slot is taken.
    pub fn start(&mut self, key: K, period_ms: u32, mode: TimerMode) -> bool {
        let period_ms = period_ms.max(1);
        let slot = TimerSlot {
            key,
            period_ms,
            remaining_ms: period_ms,
            mode,
        };

        if let Some(existing) = self.slots.iter_mut().flatten().find(|s| s.key == key) {
            *existing = slot;
            debug!("timer {:?} re-armed ({} ms)", key, period_ms);
            return true;
        }
        if let Some(free) = self.slots.iter_mut().find(|s| s.is_none()) {
            *free = Some(slot);
            debug!("timer {:?} started ({} ms, {:?})", key, period_ms, mode);
            return true;
        }

        warn!("timer {:?} not started: all {} slots in use", key, N);
        false
    }

    /// Disarm `key`; a no-op if it is not running.
    pub fn stop(&mut self, key: K) {
        for slot in self.slots.iter_mut() {
            if slot.is_some_and(|s| s.key == key) {
                *slot = None;
                debug!("timer {:?} stopped", key);
            }
        }
    }

    pub fn stop_all(&mut self) {
        self.slots = [None; N];
    }

    /// Whether `key` is armed.
    pub fn is_running(&self, key: K) -> bool {
        self.slots.iter().flatten().any(|s| s.key == key)
    }

    /// Time left until `key` next fires.
    pub fn remaining_ms(&self, key: K) -> Option<u32> {
        self.slots
            .iter()
            .flatten()
            .find(|s| s.key == key)
            .map(|s| s.remaining_ms)
    }

    /// Time until the earliest running timer fires.
    pub fn next_deadline_ms(&self) -> Option<u32> {
        self.slots.iter().flatten().map(|s| s.remaining_ms).min()
    }

    /// Consume up to `budget` milliseconds and return the next timer that
    /// expires within it.  `budget` is reduced by the time consumed.
    ///
    /// Returns `None` once no running timer expires within what is left of
    /// the budget; the remainder is then charged to every running timer.
    pub fn pop_expired(&mut self, budget: &mut u32) -> Option<K> {
        let mut earliest: Option<usize> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(s) = slot else { continue };
            if s.remaining_ms > *budget {
                continue;
            }
            let better = match earliest.and_then(|e| self.slots[e]) {
                Some(best) => s.remaining_ms < best.remaining_ms,
                None => true,
            };
            if better {
                earliest = Some(i);
            }
        }

        let Some(index) = earliest else {
            self.charge(*budget);
            *budget = 0;
            return None;
        };

        let step = self.slots[index].map_or(0, |s| s.remaining_ms);
        self.charge(step);
        *budget -= step;

        let fired = self.slots[index]?;
        match fired.mode {
            TimerMode::Periodic => {
                if let Some(s) = self.slots[index].as_mut() {
                    s.remaining_ms = s.period_ms;
                }
            }
            TimerMode::OneShot => self.slots[index] = None,
        }
        Some(fired.key)
    }

    fn charge(&mut self, ms: u32) {
        for s in self.slots.iter_mut().flatten() {
            s.remaining_ms = s.remaining_ms.saturating_sub(ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(t: &mut Timers<TimerId, 4>, mut budget: u32) -> std::vec::Vec<TimerId> {
        let mut fired = std::vec::Vec::new();
        while let Some(k) = t.pop_expired(&mut budget) {
            fired.push(k);
        }
        fired
    }

    #[test]
    fn periodic_fires_every_period() {
        let mut t = Timers::<TimerId, 4>::new();
        t.start(TimerId::Blink, 500, TimerMode::Periodic);
        assert!(drain(&mut t, 499).is_empty());
        assert_eq!(drain(&mut t, 1), [TimerId::Blink]);
        assert_eq!(drain(&mut t, 1000), [TimerId::Blink, TimerId::Blink]);
        assert!(t.is_running(TimerId::Blink));
    }

    #[test]
    fn one_shot_fires_once() {
        let mut t = Timers::<TimerId, 4>::new();
        t.start(TimerId::PowerFlash, 2000, TimerMode::OneShot);
        assert_eq!(drain(&mut t, 5000), [TimerId::PowerFlash]);
        assert!(!t.is_running(TimerId::PowerFlash));
    }

    #[test]
    fn expiries_come_out_in_deadline_order() {
        let mut t = Timers::<TimerId, 4>::new();
        t.start(TimerId::Countdown, 1000, TimerMode::Periodic);
        t.start(TimerId::Blink, 500, TimerMode::Periodic);
        assert_eq!(
            drain(&mut t, 1000),
            [TimerId::Blink, TimerId::Countdown, TimerId::Blink]
        );
    }

    #[test]
    fn stopped_timer_never_fires() {
        let mut t = Timers::<TimerId, 4>::new();
        t.start(TimerId::Countdown, 1000, TimerMode::Periodic);
        t.start(TimerId::Blink, 500, TimerMode::Periodic);
        let mut budget = 1500;
        assert_eq!(t.pop_expired(&mut budget), Some(TimerId::Blink));
        t.stop(TimerId::Countdown);
        assert_eq!(t.pop_expired(&mut budget), Some(TimerId::Blink));
        assert_eq!(t.pop_expired(&mut budget), Some(TimerId::Blink));
        assert_eq!(t.pop_expired(&mut budget), None);
    }

    #[test]
    fn restart_rearms_full_period() {
        let mut t = Timers::<TimerId, 4>::new();
        t.start(TimerId::ClockMinute, 60_000, TimerMode::Periodic);
        assert!(drain(&mut t, 59_000).is_empty());
        t.start(TimerId::ClockMinute, 60_000, TimerMode::Periodic);
        assert_eq!(t.remaining_ms(TimerId::ClockMinute), Some(60_000));
        assert!(drain(&mut t, 59_999).is_empty());
    }

    #[test]
    fn full_table_rejects_new_timer() {
        let mut t = Timers::<TimerId, 2>::new();
        assert!(t.start(TimerId::Blink, 10, TimerMode::Periodic));
        assert!(t.start(TimerId::Countdown, 10, TimerMode::Periodic));
        assert!(!t.start(TimerId::ClockMinute, 10, TimerMode::Periodic));
        assert_eq!(t.next_deadline_ms(), Some(10));
    }
}
