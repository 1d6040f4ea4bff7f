//! Legacy flat command-word format.
//!
//! Older panel/simulator builds exchange a single little-endian `u32`
//! command word, optionally followed by a raw value:
//!
//! ```text
//! ┌───────────────┬───────────────────────────────────────┐
//! │ Command (4B)  │ CURRENT_* only: raw Time (16B)        │
//! │ one-hot bit   │                 or power level (4B)   │
//! └───────────────┴───────────────────────────────────────┘
//! ```
//!
//! There is no destination marker and no category byte.  This module maps
//! those words onto canonical [`Frame`]s so the same domain events serve
//! both formats.  STATE frames and STATE_REQUEST have no legacy form.

use heapless::Vec;

use super::{Code, Destination, Frame, SignalCode, UpdateCode};
use crate::error::CodecError;
use crate::time::Time;

/// Largest legacy message: command word plus a raw `Time`.
pub const LEGACY_MAX_LEN: usize = 4 + 16;

/// Legacy command words.
pub mod word {
    pub const NONE: u32 = 0;
    pub const TIME_COOK: u32 = 0x0000_0001;
    pub const POWER_LEVEL: u32 = 0x0000_0002;
    pub const KITCHEN_TIMER: u32 = 0x0000_0004;
    pub const CLOCK: u32 = 0x0000_0008;
    pub const DIGIT_0: u32 = 0x0000_0010;
    pub const DIGIT_9: u32 = 0x0000_2000;
    pub const STOP: u32 = 0x0000_4000;
    pub const START: u32 = 0x0000_8000;
    pub const MOD_LEFT_TENS: u32 = 0x0001_0000;
    pub const MOD_LEFT_ONES: u32 = 0x0002_0000;
    pub const MOD_RIGHT_TENS: u32 = 0x0004_0000;
    pub const MOD_RIGHT_ONES: u32 = 0x0008_0000;
    pub const BLINK: u32 = 0x0010_0000;
    pub const CURRENT_POWER: u32 = 0x1000_0000;
    pub const CURRENT_KITCHEN: u32 = 0x2000_0000;
    pub const CURRENT_COOK: u32 = 0x4000_0000;
    pub const CURRENT_CLOCK: u32 = 0x8000_0000;
}

fn signal_from_word(w: u32) -> Option<SignalCode> {
    let signal = match w {
        word::TIME_COOK => SignalCode::CookTime,
        word::POWER_LEVEL => SignalCode::PowerLevel,
        word::KITCHEN_TIMER => SignalCode::KitchenTimer,
        word::CLOCK => SignalCode::Clock,
        word::STOP => SignalCode::Stop,
        word::START => SignalCode::Start,
        word::MOD_LEFT_TENS => SignalCode::ModLeftTens,
        word::MOD_LEFT_ONES => SignalCode::ModLeftOnes,
        word::MOD_RIGHT_TENS => SignalCode::ModRightTens,
        word::MOD_RIGHT_ONES => SignalCode::ModRightOnes,
        word::BLINK => SignalCode::BlinkOn,
        w if (word::DIGIT_0..=word::DIGIT_9).contains(&w) && w.is_power_of_two() => {
            SignalCode::digit((w / word::DIGIT_0).trailing_zeros() as u8)?
        }
        _ => return None,
    };
    Some(signal)
}

fn word_from_signal(signal: SignalCode) -> Option<u32> {
    if let Some(d) = signal.as_digit() {
        return Some(word::DIGIT_0 << d);
    }
    let w = match signal {
        SignalCode::CookTime => word::TIME_COOK,
        SignalCode::PowerLevel => word::POWER_LEVEL,
        SignalCode::KitchenTimer => word::KITCHEN_TIMER,
        SignalCode::Clock => word::CLOCK,
        SignalCode::Stop => word::STOP,
        SignalCode::Start => word::START,
        SignalCode::ModLeftTens => word::MOD_LEFT_TENS,
        SignalCode::ModLeftOnes => word::MOD_LEFT_ONES,
        SignalCode::ModRightTens => word::MOD_RIGHT_TENS,
        SignalCode::ModRightOnes => word::MOD_RIGHT_ONES,
        // The legacy blink is a bare toggle; both phases map onto it.
        SignalCode::BlinkOn | SignalCode::BlinkOff => word::BLINK,
        _ => return None,
    };
    Some(w)
}

/// Translate one legacy message into a canonical frame addressed to `to`.
///
/// `bytes` must hold exactly one message: the command word plus, for the
/// `CURRENT_*` words, its raw value.
pub fn decode(bytes: &[u8], to: Destination) -> Result<Frame, CodecError> {
    let (head, rest) = bytes
        .split_first_chunk::<4>()
        .ok_or(CodecError::BadLength(bytes.len()))?;
    let w = u32::from_le_bytes(*head);

    let raw_time = |rest: &[u8]| -> Result<Time, CodecError> {
        let raw: &[u8; 16] = rest
            .try_into()
            .map_err(|_| CodecError::BadLength(bytes.len()))?;
        Time::from_raw(raw).ok_or(CodecError::UnknownCode(w))
    };

    match w {
        word::CURRENT_CLOCK => Ok(Frame::update_time(to, UpdateCode::Clock, &raw_time(rest)?)),
        word::CURRENT_COOK | word::CURRENT_KITCHEN => {
            Ok(Frame::update_time(to, UpdateCode::DisplayTimer, &raw_time(rest)?))
        }
        word::CURRENT_POWER => {
            let raw: [u8; 4] = rest
                .try_into()
                .map_err(|_| CodecError::BadLength(bytes.len()))?;
            let level = u32::from_le_bytes(raw);
            if !(1..=10).contains(&level) {
                return Err(CodecError::UnknownCode(w));
            }
            Ok(Frame::update_power(to, level as u8))
        }
        _ => {
            if !rest.is_empty() {
                return Err(CodecError::BadLength(bytes.len()));
            }
            signal_from_word(w)
                .map(|s| Frame::signal(to, s))
                .ok_or(CodecError::UnknownCode(w))
        }
    }
}

/// Translate a canonical frame into its legacy form, if it has one.
pub fn encode(frame: &Frame) -> Option<Vec<u8, LEGACY_MAX_LEN>> {
    let mut out = Vec::new();
    match frame.code {
        Code::Signal(signal) => {
            out.extend_from_slice(&word_from_signal(signal)?.to_le_bytes()).ok()?;
        }
        Code::Update(UpdateCode::Clock) => {
            out.extend_from_slice(&word::CURRENT_CLOCK.to_le_bytes()).ok()?;
            out.extend_from_slice(&frame.ascii_time()?.to_raw()).ok()?;
        }
        Code::Update(UpdateCode::DisplayTimer) => {
            out.extend_from_slice(&word::CURRENT_COOK.to_le_bytes()).ok()?;
            out.extend_from_slice(&frame.ascii_time()?.to_raw()).ok()?;
        }
        Code::Update(UpdateCode::PowerLevel) => {
            out.extend_from_slice(&word::CURRENT_POWER.to_le_bytes()).ok()?;
            out.extend_from_slice(&(frame.ascii_power()? as u32).to_le_bytes()).ok()?;
        }
        Code::Update(UpdateCode::None) | Code::State(_) => return None,
    }
    Some(out)
}
