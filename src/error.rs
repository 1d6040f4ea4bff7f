//! Unified error types for the oven panel crate.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! service layer's error handling uniform.  All variants are `Copy` so they
//! can be passed through the engine and services without allocation.
//!
//! Most runtime faults in this system are *not* errors: garbled frames,
//! unknown enumerators and rejected digits are dropped silently.  What is
//! left here are construction bugs and malformed input handed directly to
//! the decoder.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A frame could not be decoded.
    Codec(CodecError),
    /// The state machine was misconfigured or misused.
    Machine(HfsmError),
    /// Configuration failed validation.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Machine(e) => write!(f, "hfsm: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Input was not exactly one frame long.
    BadLength(usize),
    /// The destination marker matched neither APP nor DEV.
    UnknownDestination(u32),
    /// The category byte was not STATE, SIGNAL or UPDATE.
    UnknownCategory(u8),
    /// The category was valid but the enumerator was not.
    UnknownCode(u32),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadLength(len) => write!(f, "expected 24 bytes, got {len}"),
            Self::UnknownDestination(raw) => write!(f, "unknown destination 0x{raw:08X}"),
            Self::UnknownCategory(raw) => write!(f, "unknown category 0x{raw:02X}"),
            Self::UnknownCode(raw) => write!(f, "unknown code 0x{raw:08X}"),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// State machine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HfsmError {
    /// `dispatch` was called before `start`.
    NotStarted,
    /// `start` was called twice.
    AlreadyStarted,
    /// More states or transitions than the engine can hold.
    CapacityExceeded,
    /// A state was declared twice.
    DuplicateState(&'static str),
    /// The state with this index was never declared.
    MissingState(usize),
    /// A second state without a parent.
    SecondRoot(&'static str),
    /// A composite state's initial child is not one of its children.
    BadInitial(&'static str),
    /// No state without a parent.
    NoRoot,
}

impl fmt::Display for HfsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "dispatch before start"),
            Self::AlreadyStarted => write!(f, "machine already started"),
            Self::CapacityExceeded => write!(f, "state table capacity exceeded"),
            Self::DuplicateState(name) => write!(f, "state '{name}' declared twice"),
            Self::MissingState(index) => write!(f, "state #{index} never declared"),
            Self::SecondRoot(name) => write!(f, "'{name}' is a second root state"),
            Self::BadInitial(name) => write!(f, "initial child of '{name}' is not its child"),
            Self::NoRoot => write!(f, "no root state"),
        }
    }
}

impl From<HfsmError> for Error {
    fn from(e: HfsmError) -> Self {
        Self::Machine(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` names the field and the constraint.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
