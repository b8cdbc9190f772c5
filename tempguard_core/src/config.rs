//! Runtime configuration types for the control loop.
//!
//! These are separate from the TOML-deserialized config in `tempguard_config`;
//! see `conversions` for the mapping.

use std::time::Duration;

/// The two accepted temperature-target values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    /// Target applied on AC power.
    pub desired_max_temp: i32,
    /// Offset for the on-battery value. May be negative.
    pub battery_delta: i32,
}

impl Targets {
    pub fn new(desired_max_temp: i32, battery_delta: i32) -> Self {
        Self {
            desired_max_temp,
            battery_delta,
        }
    }

    #[inline]
    pub fn battery_target(&self) -> i32 {
        self.desired_max_temp.saturating_add(self.battery_delta)
    }
}

/// Poll cadence for the two loop phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCfg {
    /// Used while the setting holds.
    pub base: Duration,
    /// Used right after a correction.
    pub fast: Duration,
}

impl Default for PollCfg {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(60),
            fast: Duration::from_secs(5),
        }
    }
}

/// Per-invocation limits for the external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub tool: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            tool: Duration::from_secs(10),
        }
    }
}
