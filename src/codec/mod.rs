//! Fixed-size binary frame protocol between the panel and the oven.
//!
//! Wire format (24 bytes, little-endian words, no padding):
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────────┐
//! │ Destination (4B)│ Code (4B)       │ Payload (16B)                │
//! │ "ppaM" / "vedM" │ cat<<24 | 1<<n  │ ASCII digits / raw Time / u32│
//! └─────────────────┴─────────────────┴──────────────────────────────┘
//! ```
//!
//! The top byte of `code` names the category (STATE, SIGNAL, UPDATE); the
//! low 24 bits hold one set bit that selects the enumerator within it.
//! Decoding reads the category first and then the enumerator, producing a
//! [`Code`] variant per category.

pub mod legacy;
pub mod stream;

use crate::error::CodecError;
use crate::time::{DigitPosition, Time};

/// Size of one encoded frame.
pub const FRAME_LEN: usize = 24;

/// Size of the payload field.
pub const PAYLOAD_LEN: usize = 16;

// ═══════════════════════════════════════════════════════════════
//  Destination
// ═══════════════════════════════════════════════════════════════

/// Which process a frame is addressed to.  Doubles as the stream sync marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Device → application (panel).
    App,
    /// Application → device (oven).
    Dev,
}

impl Destination {
    pub const APP_MARKER: u32 = 0x4D61_7070;
    pub const DEV_MARKER: u32 = 0x4D64_6576;

    /// Start-of-frame marker word for this destination.
    pub const fn marker(self) -> u32 {
        match self {
            Self::App => Self::APP_MARKER,
            Self::Dev => Self::DEV_MARKER,
        }
    }

    /// The marker as it appears on the wire (low byte first).
    pub const fn marker_bytes(self) -> [u8; 4] {
        self.marker().to_le_bytes()
    }

    /// Recognize a start-of-frame marker.
    pub fn from_marker(raw: u32) -> Result<Self, CodecError> {
        match raw {
            Self::APP_MARKER => Ok(Self::App),
            Self::DEV_MARKER => Ok(Self::Dev),
            other => Err(CodecError::UnknownDestination(other)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Categories and enumerators
// ═══════════════════════════════════════════════════════════════

/// Category discriminant carried in the top byte of `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Category {
    State = 0x10,
    Signal = 0x20,
    Update = 0x40,
}

const fn with_category(cat: Category, bits: u32) -> u32 {
    ((cat as u32) << 24) | bits
}

/// State identities, announced by the oven for resynchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateCode {
    None,
    DisplayClock,
    ClockSelectHourTens,
    ClockSelectHourOnes,
    ClockSelectMinuteTens,
    ClockSelectMinuteOnes,
    SetCookTimer,
    SetPowerLevel,
    KitchenSelectMinuteTens,
    KitchenSelectMinuteOnes,
    KitchenSelectSecondTens,
    KitchenSelectSecondOnes,
    DisplayTimer,
    DisplayTimerPaused,
}

impl StateCode {
    pub const ALL: [StateCode; 14] = [
        Self::None,
        Self::DisplayClock,
        Self::ClockSelectHourTens,
        Self::ClockSelectHourOnes,
        Self::ClockSelectMinuteTens,
        Self::ClockSelectMinuteOnes,
        Self::SetCookTimer,
        Self::SetPowerLevel,
        Self::KitchenSelectMinuteTens,
        Self::KitchenSelectMinuteOnes,
        Self::KitchenSelectSecondTens,
        Self::KitchenSelectSecondOnes,
        Self::DisplayTimer,
        Self::DisplayTimerPaused,
    ];

    const fn bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::DisplayClock => 0x0001,
            Self::ClockSelectHourTens => 0x0002,
            Self::ClockSelectHourOnes => 0x0004,
            Self::ClockSelectMinuteTens => 0x0008,
            Self::ClockSelectMinuteOnes => 0x0010,
            Self::SetCookTimer => 0x0020,
            Self::SetPowerLevel => 0x0080,
            Self::KitchenSelectMinuteTens => 0x0100,
            Self::KitchenSelectMinuteOnes => 0x0200,
            Self::KitchenSelectSecondTens => 0x0400,
            Self::KitchenSelectSecondOnes => 0x0800,
            Self::DisplayTimer => 0x1000,
            Self::DisplayTimerPaused => 0x2000,
        }
    }

    /// Wire value of this state code.
    pub const fn raw(self) -> u32 {
        with_category(Category::State, self.bits())
    }

    fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.bits() == bits)
    }

    /// The clock field being edited, if this is a clock-select state.
    pub fn clock_field(self) -> Option<DigitPosition> {
        match self {
            Self::ClockSelectHourTens => Some(DigitPosition::LeftTens),
            Self::ClockSelectHourOnes => Some(DigitPosition::LeftOnes),
            Self::ClockSelectMinuteTens => Some(DigitPosition::RightTens),
            Self::ClockSelectMinuteOnes => Some(DigitPosition::RightOnes),
            _ => None,
        }
    }

    /// The countdown field being edited, if this is a kitchen-select state.
    pub fn kitchen_field(self) -> Option<DigitPosition> {
        match self {
            Self::KitchenSelectMinuteTens => Some(DigitPosition::LeftTens),
            Self::KitchenSelectMinuteOnes => Some(DigitPosition::LeftOnes),
            Self::KitchenSelectSecondTens => Some(DigitPosition::RightTens),
            Self::KitchenSelectSecondOnes => Some(DigitPosition::RightOnes),
            _ => None,
        }
    }
}

/// Button presses, acknowledgements and blink/field-select notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalCode {
    None,
    Clock,
    CookTime,
    PowerLevel,
    KitchenTimer,
    Stop,
    Start,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    BlinkOn,
    BlinkOff,
    ModLeftTens,
    ModLeftOnes,
    ModRightTens,
    ModRightOnes,
    StateRequest,
}

impl SignalCode {
    pub const ALL: [SignalCode; 24] = [
        Self::None,
        Self::Clock,
        Self::CookTime,
        Self::PowerLevel,
        Self::KitchenTimer,
        Self::Stop,
        Self::Start,
        Self::Digit0,
        Self::Digit1,
        Self::Digit2,
        Self::Digit3,
        Self::Digit4,
        Self::Digit5,
        Self::Digit6,
        Self::Digit7,
        Self::Digit8,
        Self::Digit9,
        Self::BlinkOn,
        Self::BlinkOff,
        Self::ModLeftTens,
        Self::ModLeftOnes,
        Self::ModRightTens,
        Self::ModRightOnes,
        Self::StateRequest,
    ];

    const DIGITS: [SignalCode; 10] = [
        Self::Digit0,
        Self::Digit1,
        Self::Digit2,
        Self::Digit3,
        Self::Digit4,
        Self::Digit5,
        Self::Digit6,
        Self::Digit7,
        Self::Digit8,
        Self::Digit9,
    ];

    const fn bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Clock => 0x0000_0001,
            Self::CookTime => 0x0000_0002,
            Self::PowerLevel => 0x0000_0004,
            Self::KitchenTimer => 0x0000_0008,
            Self::Stop => 0x0000_0010,
            Self::Start => 0x0000_0020,
            Self::Digit0 => 0x0000_0040,
            Self::Digit1 => 0x0000_0080,
            Self::Digit2 => 0x0000_0100,
            Self::Digit3 => 0x0000_0200,
            Self::Digit4 => 0x0000_0400,
            Self::Digit5 => 0x0000_0800,
            Self::Digit6 => 0x0000_1000,
            Self::Digit7 => 0x0000_2000,
            Self::Digit8 => 0x0000_4000,
            Self::Digit9 => 0x0000_8000,
            Self::BlinkOn => 0x0001_0000,
            Self::BlinkOff => 0x0002_0000,
            Self::ModLeftTens => 0x0004_0000,
            Self::ModLeftOnes => 0x0008_0000,
            Self::ModRightTens => 0x0010_0000,
            Self::ModRightOnes => 0x0020_0000,
            Self::StateRequest => 0x0040_0000,
        }
    }

    /// Wire value of this signal code.
    pub const fn raw(self) -> u32 {
        with_category(Category::Signal, self.bits())
    }

    fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.bits() == bits)
    }

    /// The signal for keypad digit `d`, if `d` is 0-9.
    pub fn digit(d: u8) -> Option<Self> {
        Self::DIGITS.get(d as usize).copied()
    }

    /// The keypad digit this signal carries, if it is a digit signal.
    pub fn as_digit(self) -> Option<u8> {
        Self::DIGITS.iter().position(|s| *s == self).map(|d| d as u8)
    }

    /// The field-select signal for `pos`.
    pub const fn select(pos: DigitPosition) -> Self {
        match pos {
            DigitPosition::LeftTens => Self::ModLeftTens,
            DigitPosition::LeftOnes => Self::ModLeftOnes,
            DigitPosition::RightTens => Self::ModRightTens,
            DigitPosition::RightOnes => Self::ModRightOnes,
        }
    }

    /// The field a `MOD_*` signal selects.
    pub const fn as_select(self) -> Option<DigitPosition> {
        match self {
            Self::ModLeftTens => Some(DigitPosition::LeftTens),
            Self::ModLeftOnes => Some(DigitPosition::LeftOnes),
            Self::ModRightTens => Some(DigitPosition::RightTens),
            Self::ModRightOnes => Some(DigitPosition::RightOnes),
            _ => None,
        }
    }
}

/// Value updates pushed by the oven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateCode {
    None,
    Clock,
    DisplayTimer,
    PowerLevel,
}

impl UpdateCode {
    pub const ALL: [UpdateCode; 4] = [Self::None, Self::Clock, Self::DisplayTimer, Self::PowerLevel];

    const fn bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Clock => 0x0001,
            Self::DisplayTimer => 0x0002,
            Self::PowerLevel => 0x0004,
        }
    }

    /// Wire value of this update code.
    pub const fn raw(self) -> u32 {
        with_category(Category::Update, self.bits())
    }

    fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.bits() == bits)
    }
}

/// A decoded `code` field: one variant per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    State(StateCode),
    Signal(SignalCode),
    Update(UpdateCode),
}

impl Code {
    /// Wire value, category bits included.
    pub const fn raw(self) -> u32 {
        match self {
            Self::State(c) => c.raw(),
            Self::Signal(c) => c.raw(),
            Self::Update(c) => c.raw(),
        }
    }

    /// Decode a wire value into its category and code.
    pub fn from_raw(raw: u32) -> Result<Self, CodecError> {
        let category = (raw >> 24) as u8;
        let bits = raw & 0x00FF_FFFF;
        let code = match category {
            0x10 => StateCode::from_bits(bits).map(Self::State),
            0x20 => SignalCode::from_bits(bits).map(Self::Signal),
            0x40 => UpdateCode::from_bits(bits).map(Self::Update),
            other => return Err(CodecError::UnknownCategory(other)),
        };
        code.ok_or(CodecError::UnknownCode(raw))
    }

    /// Which of the three code spaces this belongs to.
    pub const fn category(self) -> Category {
        match self {
            Self::State(_) => Category::State,
            Self::Signal(_) => Category::Signal,
            Self::Update(_) => Category::Update,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Frame
// ═══════════════════════════════════════════════════════════════

/// One protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub destination: Destination,
    pub code: Code,
    pub payload: [u8; PAYLOAD_LEN],
}

impl Frame {
    /// A frame with an all-zero payload.
    pub fn new(destination: Destination, code: Code) -> Self {
        Self {
            destination,
            code,
            payload: [0; PAYLOAD_LEN],
        }
    }

    /// SIGNAL frame; signals carry no payload.
    pub fn signal(destination: Destination, signal: SignalCode) -> Self {
        Self::new(destination, Code::Signal(signal))
    }

    /// UPDATE frame carrying a time as four ASCII digits.
    pub fn update_time(destination: Destination, update: UpdateCode, time: &Time) -> Self {
        let mut frame = Self::new(destination, Code::Update(update));
        frame.payload[..4].copy_from_slice(&time.to_ascii());
        frame
    }

    /// UPDATE POWER_LEVEL frame carrying the level as two ASCII digits.
    pub fn update_power(destination: Destination, level: u8) -> Self {
        let mut frame = Self::new(destination, Code::Update(UpdateCode::PowerLevel));
        frame.payload[0] = b'0' + level / 10;
        frame.payload[1] = b'0' + level % 10;
        frame
    }

    /// STATE frame carrying a raw `Time`.
    pub fn state_time(destination: Destination, state: StateCode, time: &Time) -> Self {
        Self {
            destination,
            code: Code::State(state),
            payload: time.to_raw(),
        }
    }

    /// STATE frame carrying a raw little-endian power level.
    pub fn state_power(destination: Destination, state: StateCode, level: u8) -> Self {
        let mut frame = Self::new(destination, Code::State(state));
        frame.payload[..4].copy_from_slice(&(level as u32).to_le_bytes());
        frame
    }

    // ── Payload views ─────────────────────────────────────────

    /// Four ASCII digits at the start of the payload, as UPDATE frames carry them.
    pub fn ascii_time(&self) -> Option<Time> {
        Time::from_ascii(&self.payload[..4])
    }

    /// Two ASCII digits, 01-10.
    pub fn ascii_power(&self) -> Option<u8> {
        let [tens, ones] = [self.payload[0], self.payload[1]];
        if !tens.is_ascii_digit() || !ones.is_ascii_digit() {
            return None;
        }
        let level = (tens - b'0') * 10 + (ones - b'0');
        (1..=10).contains(&level).then_some(level)
    }

    /// Four little-endian digit words, as STATE frames carry them.
    pub fn raw_time(&self) -> Option<Time> {
        Time::from_raw(&self.payload)
    }

    /// One little-endian power word, 1-10.
    pub fn raw_power(&self) -> Option<u8> {
        let word = u32::from_le_bytes([
            self.payload[0],
            self.payload[1],
            self.payload[2],
            self.payload[3],
        ]);
        (1..=10).contains(&word).then_some(word as u8)
    }

    // ── Encode / decode ───────────────────────────────────────

    /// Flat copy of the three fields in wire order.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut out = [0u8; FRAME_LEN];
        out[..4].copy_from_slice(&self.destination.marker_bytes());
        out[4..8].copy_from_slice(&self.code.raw().to_le_bytes());
        out[8..].copy_from_slice(&self.payload);
        out
    }

    /// Decode exactly one frame.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let bytes: &[u8; FRAME_LEN] = bytes
            .try_into()
            .map_err(|_| CodecError::BadLength(bytes.len()))?;

        let destination =
            Destination::from_marker(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))?;
        let code = Code::from_raw(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]))?;
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&bytes[8..]);

        Ok(Self {
            destination,
            code,
            payload,
        })
    }
}
