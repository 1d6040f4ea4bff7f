//! Four-digit time values shared by the clock and the countdowns.
//!
//! A [`Time`] is four independent decimal digits laid out as
//! `left_tens left_ones : right_tens right_ones`.  The same type holds a
//! 24-hour clock (HH:MM) and a cook or kitchen countdown (MM:SS); which
//! digit limits apply depends on who is editing it, so validation lives in
//! the guard helpers below rather than in the type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// One of the four digit slots on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigitPosition {
    LeftTens,
    LeftOnes,
    RightTens,
    RightOnes,
}

impl DigitPosition {
    pub const ALL: [DigitPosition; 4] = [
        Self::LeftTens,
        Self::LeftOnes,
        Self::RightTens,
        Self::RightOnes,
    ];

    /// The slot edited after this one; wraps from the last back to the first.
    pub const fn next(self) -> Self {
        match self {
            Self::LeftTens => Self::LeftOnes,
            Self::LeftOnes => Self::RightTens,
            Self::RightTens => Self::RightOnes,
            Self::RightOnes => Self::LeftTens,
        }
    }
}

/// Four decimal digits, each 0-9.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Time {
    pub left_tens: u8,
    pub left_ones: u8,
    pub right_tens: u8,
    pub right_ones: u8,
}

impl Time {
    pub const ZERO: Time = Time::new(0, 0, 0, 0);

    /// Largest countdown the four digits can show.
    pub const MAX_COUNTDOWN: Time = Time::new(9, 9, 5, 9);

    /// Digits as they appear on the display, left to right.
    pub const fn new(left_tens: u8, left_ones: u8, right_tens: u8, right_ones: u8) -> Self {
        Self {
            left_tens,
            left_ones,
            right_tens,
            right_ones,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn clear(&mut self) {
        *self = Self::ZERO;
    }

    /// The digit shown at `pos`.
    pub fn digit(&self, pos: DigitPosition) -> u8 {
        match pos {
            DigitPosition::LeftTens => self.left_tens,
            DigitPosition::LeftOnes => self.left_ones,
            DigitPosition::RightTens => self.right_tens,
            DigitPosition::RightOnes => self.right_ones,
        }
    }

    /// Overwrite the digit at `pos`.
    pub fn set_digit(&mut self, pos: DigitPosition, value: u8) {
        match pos {
            DigitPosition::LeftTens => self.left_tens = value,
            DigitPosition::LeftOnes => self.left_ones = value,
            DigitPosition::RightTens => self.right_tens = value,
            DigitPosition::RightOnes => self.right_ones = value,
        }
    }

    /// `left_tens left_ones` read as a two-digit number.
    pub fn left(&self) -> u32 {
        self.left_tens as u32 * 10 + self.left_ones as u32
    }

    /// `right_tens right_ones` read as a two-digit number.
    pub fn right(&self) -> u32 {
        self.right_tens as u32 * 10 + self.right_ones as u32
    }

    /// True if this is a reachable 24-hour clock value (00:00-23:59).
    pub fn is_valid_clock(&self) -> bool {
        self.left_tens <= 2
            && self.left_ones <= 9
            && self.left() <= 23
            && self.right_tens <= 5
            && self.right_ones <= 9
    }

    // ── Clock arithmetic ──────────────────────────────────────

    /// Advance a clock value by one minute.
    ///
    /// Carries minute-ones → minute-tens → hour and wraps 23:59 → 00:00.
    pub fn advance_minute(&mut self) {
        self.right_ones += 1;
        if self.right_ones < 10 {
            return;
        }
        self.right_ones = 0;
        self.right_tens += 1;
        if self.right_tens < 6 {
            return;
        }
        self.right_tens = 0;
        self.left_ones += 1;
        if self.left_tens == 2 && self.left_ones == 4 {
            self.left_tens = 0;
            self.left_ones = 0;
        } else if self.left_ones == 10 {
            self.left_ones = 0;
            self.left_tens += 1;
        }
    }

    // ── Countdown arithmetic ──────────────────────────────────

    /// Decrement a countdown by one second.
    ///
    /// Borrows seconds-ones → seconds-tens → minutes, the inverse of
    /// [`advance_minute`](Self::advance_minute).  Returns `true` when the
    /// countdown is at 00:00 afterwards; a zero countdown stays zero.
    pub fn count_down(&mut self) -> bool {
        if self.is_zero() {
            return true;
        }
        if self.right_ones > 0 {
            self.right_ones -= 1;
        } else {
            self.right_ones = 9;
            if self.right_tens > 0 {
                self.right_tens -= 1;
            } else {
                self.right_tens = 5;
                if self.left_ones > 0 {
                    self.left_ones -= 1;
                } else {
                    self.left_ones = 9;
                    self.left_tens -= 1;
                }
            }
        }
        self.is_zero()
    }

    /// Add `secs` seconds to a countdown, normalizing seconds to 0-59 and
    /// saturating at 99:59.
    pub fn add_seconds(&mut self, secs: u32) {
        let total = (self.left() * 60 + self.right() + secs).min(99 * 60 + 59);
        let minutes = total / 60;
        let seconds = total % 60;
        *self = Self::new(
            (minutes / 10) as u8,
            (minutes % 10) as u8,
            (seconds / 10) as u8,
            (seconds % 10) as u8,
        );
    }

    /// Push a digit in from the right, dropping the leftmost digit.
    pub fn shift_in(&mut self, digit: u8) {
        self.left_tens = self.left_ones;
        self.left_ones = self.right_tens;
        self.right_tens = self.right_ones;
        self.right_ones = digit;
    }

    // ── Wire helpers ──────────────────────────────────────────

    /// Four ASCII digits, as carried by UPDATE frames.
    pub fn to_ascii(&self) -> [u8; 4] {
        [
            b'0' + self.left_tens,
            b'0' + self.left_ones,
            b'0' + self.right_tens,
            b'0' + self.right_ones,
        ]
    }

    /// Parse four ASCII digits.  Returns `None` if any byte is not `0`-`9`.
    pub fn from_ascii(bytes: &[u8]) -> Option<Self> {
        let digits: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        let mut out = [0u8; 4];
        for (o, b) in out.iter_mut().zip(digits) {
            if !b.is_ascii_digit() {
                return None;
            }
            *o = b - b'0';
        }
        Some(Self::new(out[0], out[1], out[2], out[3]))
    }

    /// Raw layout: four little-endian `u32` digits (16 bytes).
    pub fn to_raw(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        for (chunk, d) in out.chunks_exact_mut(4).zip([
            self.left_tens,
            self.left_ones,
            self.right_tens,
            self.right_ones,
        ]) {
            chunk.copy_from_slice(&(d as u32).to_le_bytes());
        }
        out
    }

    /// Inverse of [`to_raw`](Self::to_raw).  Rejects digits above 9.
    pub fn from_raw(bytes: &[u8; 16]) -> Option<Self> {
        let mut out = [0u8; 4];
        for (o, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            if word > 9 {
                return None;
            }
            *o = word as u8;
        }
        Some(Self::new(out[0], out[1], out[2], out[3]))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            self.left_tens, self.left_ones, self.right_tens, self.right_ones
        )
    }
}

// ═══════════════════════════════════════════════════════════════
//  Digit guards
// ═══════════════════════════════════════════════════════════════

/// May `digit` be typed into `pos` of a clock being set to `proposed`?
///
/// Hour-tens is limited to 0-1 and minute-tens to 0-5.  Hour-ones is
/// limited to 0-2 after a ten-hour and to 0-3 after a twenty-hour, which
/// a running clock can still hold when editing starts.
pub fn clock_digit_allowed(pos: DigitPosition, proposed: &Time, digit: u8) -> bool {
    if digit > 9 {
        return false;
    }
    match pos {
        DigitPosition::LeftTens => digit <= 1,
        DigitPosition::LeftOnes => match proposed.left_tens {
            1 => digit <= 2,
            2 => digit <= 3,
            _ => true,
        },
        DigitPosition::RightTens => digit <= 5,
        DigitPosition::RightOnes => true,
    }
}

/// May `digit` be typed into `pos` of an MM:SS countdown?
pub fn countdown_digit_allowed(pos: DigitPosition, digit: u8) -> bool {
    match pos {
        DigitPosition::RightTens => digit <= 5,
        _ => digit <= 9,
    }
}

// ═══════════════════════════════════════════════════════════════
//  Cook entries
// ═══════════════════════════════════════════════════════════════

/// Highest power level.  Digit 0 selects it.
pub const MAX_POWER_LEVEL: u8 = 10;

/// One stage of a cook program: a countdown and the power to run it at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookEntry {
    pub timer: Time,
    /// Always 1-10.
    pub power_level: u8,
}

impl Default for CookEntry {
    fn default() -> Self {
        Self {
            timer: Time::ZERO,
            power_level: MAX_POWER_LEVEL,
        }
    }
}

impl CookEntry {
    /// Set the power level from a keypad digit: 1-9 directly, 0 means 10.
    pub fn set_power_digit(&mut self, digit: u8) {
        self.power_level = match digit {
            0 => MAX_POWER_LEVEL,
            d => d.min(9),
        };
    }

    /// Power level as two ASCII digits, as carried by UPDATE frames.
    pub fn power_ascii(&self) -> [u8; 2] {
        [b'0' + self.power_level / 10, b'0' + self.power_level % 10]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minute_ones_carry_into_tens() {
        let mut t = Time::new(0, 0, 0, 9);
        t.advance_minute();
        assert_eq!(t, Time::new(0, 0, 1, 0));
    }

    #[test]
    fn minute_tens_carry_into_hour() {
        let mut t = Time::new(0, 9, 5, 9);
        t.advance_minute();
        assert_eq!(t, Time::new(1, 0, 0, 0));
    }

    #[test]
    fn twelve_fifty_nine_rolls_to_thirteen() {
        let mut t = Time::new(1, 2, 5, 9);
        t.advance_minute();
        assert_eq!(t, Time::new(1, 3, 0, 0));
    }

    #[test]
    fn clock_wraps_at_midnight() {
        // Standard 24-hour wrap, not the 12-hour rollover.
        let mut t = Time::new(2, 3, 5, 9);
        t.advance_minute();
        assert_eq!(t, Time::ZERO);
    }

    #[test]
    fn full_day_returns_to_start() {
        let mut t = Time::new(0, 7, 1, 5);
        for _ in 0..24 * 60 {
            t.advance_minute();
            assert!(t.is_valid_clock(), "left the 24h range at {t}");
        }
        assert_eq!(t, Time::new(0, 7, 1, 5));
    }

    #[test]
    fn count_down_borrows() {
        let mut t = Time::new(1, 0, 0, 0);
        assert!(!t.count_down());
        assert_eq!(t, Time::new(0, 9, 5, 9));
    }

    #[test]
    fn count_down_reaches_zero() {
        let mut t = Time::new(0, 0, 0, 1);
        assert!(t.count_down());
        assert_eq!(t, Time::ZERO);
    }

    #[test]
    fn count_down_at_zero_stays_zero() {
        let mut t = Time::ZERO;
        assert!(t.count_down());
        assert_eq!(t, Time::ZERO);
    }

    #[test]
    fn shift_register_drops_oldest() {
        let mut t = Time::new(0, 0, 0, 1);
        t.shift_in(2);
        assert_eq!(t, Time::new(0, 0, 1, 2));
        t.shift_in(3);
        assert_eq!(t, Time::new(0, 1, 2, 3));
        t.shift_in(4);
        t.shift_in(5);
        assert_eq!(t, Time::new(2, 3, 4, 5));
    }

    #[test]
    fn add_seconds_normalizes() {
        let mut t = Time::new(0, 0, 4, 5);
        t.add_seconds(30);
        assert_eq!(t, Time::new(0, 1, 1, 5));

        let mut t = Time::new(0, 0, 3, 0);
        t.add_seconds(30);
        assert_eq!(t, Time::new(0, 1, 0, 0));

        let mut t = Time::ZERO;
        t.add_seconds(30);
        assert_eq!(t, Time::new(0, 0, 3, 0));
    }

    #[test]
    fn add_seconds_saturates() {
        let mut t = Time::new(9, 9, 5, 0);
        t.add_seconds(30);
        assert_eq!(t, Time::MAX_COUNTDOWN);
    }

    #[test]
    fn clock_guards() {
        let mut p = Time::ZERO;
        assert!(clock_digit_allowed(DigitPosition::LeftTens, &p, 1));
        assert!(!clock_digit_allowed(DigitPosition::LeftTens, &p, 2));
        assert!(clock_digit_allowed(DigitPosition::LeftOnes, &p, 9));
        p.left_tens = 1;
        assert!(clock_digit_allowed(DigitPosition::LeftOnes, &p, 2));
        assert!(!clock_digit_allowed(DigitPosition::LeftOnes, &p, 5));
        assert!(!clock_digit_allowed(DigitPosition::RightTens, &p, 6));
        assert!(clock_digit_allowed(DigitPosition::RightOnes, &p, 9));
    }

    #[test]
    fn twenty_hour_keeps_hour_ones_in_range() {
        let p = Time::new(2, 3, 0, 0);
        assert!(clock_digit_allowed(DigitPosition::LeftOnes, &p, 3));
        assert!(!clock_digit_allowed(DigitPosition::LeftOnes, &p, 4));
        assert!(!clock_digit_allowed(DigitPosition::LeftOnes, &p, 9));
    }

    #[test]
    fn ascii_roundtrip_and_rejects_garbage() {
        let t = Time::new(1, 2, 3, 4);
        assert_eq!(&t.to_ascii(), b"1234");
        assert_eq!(Time::from_ascii(b"1234"), Some(t));
        assert_eq!(Time::from_ascii(b"12:4"), None);
        assert_eq!(Time::from_ascii(b"12"), None);
    }

    #[test]
    fn raw_rejects_non_digits() {
        let mut raw = Time::new(0, 0, 0, 0).to_raw();
        raw[12] = 10;
        assert_eq!(Time::from_raw(&raw), None);
    }

    #[test]
    fn power_digit_zero_means_ten() {
        let mut e = CookEntry::default();
        e.set_power_digit(0);
        assert_eq!(e.power_level, 10);
        for d in 1..=9 {
            e.set_power_digit(d);
            assert_eq!(e.power_level, d);
        }
        assert_eq!(&e.power_ascii(), b"09");
        e.set_power_digit(0);
        assert_eq!(&e.power_ascii(), b"10");
    }
}
