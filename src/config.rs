//! Oven configuration parameters
//!
//! All tunable timing and default values for both ends of the link.
//! Values can be overridden by the embedding process (JSON file, command
//! line, provisioning message); nothing here is persisted by the crate.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::time::Time;

/// Core oven configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvenConfig {
    // --- Timing ---
    /// Clock advance period (milliseconds); one minute on real hardware
    pub clock_tick_ms: u32,
    /// Blink toggle period (milliseconds)
    pub blink_interval_ms: u32,
    /// Countdown decrement period (milliseconds)
    pub countdown_interval_ms: u32,
    /// Panel state-request polling period while unsynchronized (milliseconds)
    pub state_request_interval_ms: u32,
    /// How long the panel shows the power level during a countdown (milliseconds)
    pub power_flash_ms: u32,

    // --- Cooking ---
    /// Power level assigned when power-level entry begins (1-10)
    pub default_power_level: u8,
    /// Seconds added by START from the clock display or a running countdown
    pub quick_start_secs: u8,

    // --- Clock ---
    /// Clock value at power-up, before anyone sets it
    pub initial_clock: Time,
}

impl Default for OvenConfig {
    fn default() -> Self {
        Self {
            // Timing
            clock_tick_ms: 60_000,          // 1/min
            blink_interval_ms: 500,         // 2 Hz
            countdown_interval_ms: 1000,    // 1 Hz
            state_request_interval_ms: 500, // 2 Hz
            power_flash_ms: 2000,

            // Cooking
            default_power_level: 10,
            quick_start_secs: 30,

            // Clock
            initial_clock: Time::ZERO,
        }
    }
}

impl OvenConfig {
    /// Reject values that would stall a timer or break a domain invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_tick_ms == 0
            || self.blink_interval_ms == 0
            || self.countdown_interval_ms == 0
            || self.state_request_interval_ms == 0
            || self.power_flash_ms == 0
        {
            return Err(ConfigError::ValidationFailed("timer periods must be non-zero"));
        }
        if !(1..=10).contains(&self.default_power_level) {
            return Err(ConfigError::ValidationFailed("default_power_level must be 1-10"));
        }
        if self.quick_start_secs == 0 || self.quick_start_secs > 59 {
            return Err(ConfigError::ValidationFailed("quick_start_secs must be 1-59"));
        }
        if !self.initial_clock.is_valid_clock() {
            return Err(ConfigError::ValidationFailed("initial_clock is not a 24-hour time"));
        }
        Ok(())
    }
}
