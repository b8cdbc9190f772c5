#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the tempguard daemon.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - Only `[target]` is mandatory; every other section falls back to defaults
//!   suited to the `undervolt` tool.
use serde::Deserialize;
use std::path::Path;

/// Highest temperature target the MSR field can express, in degrees C.
pub const MAX_TEMP_TARGET: i32 = 127;

/// Largest offset magnitude accepted in `[offsets]`, in mV.
pub const MAX_OFFSET_MV: f64 = 1000.0;

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Target {
    /// Temperature target applied on AC power.
    pub max_temp: i32,
    /// Added to `max_temp` to get the accepted on-battery value. May be negative.
    #[serde(default)]
    pub battery_delta: i32,
}

impl Target {
    #[inline]
    pub fn battery_temp(&self) -> i32 {
        self.max_temp.saturating_add(self.battery_delta)
    }
}

/// Undervolt offsets in mV, passed through to every corrective write.
#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct Offsets {
    pub core: f64,
    pub cache: f64,
    pub gpu: f64,
    pub uncore: f64,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Poll {
    /// Interval while the setting holds.
    pub base_secs: u64,
    /// Interval right after a correction.
    pub fast_secs: u64,
}

impl Default for Poll {
    fn default() -> Self {
        Self {
            base_secs: 60,
            fast_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Log {
    /// Audit log path.
    pub path: String,
    /// Retention bound; older lines are dropped past this count.
    pub max_lines: usize,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            path: "/var/log/tempguard.log".to_string(),
            max_lines: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Tool {
    /// Hardware-control program, looked up on PATH when not absolute.
    pub program: String,
    /// Arguments that make the program print its current settings.
    pub read_args: Vec<String>,
    /// Upper bound for a single read or write invocation.
    pub timeout_ms: u64,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            program: "undervolt".to_string(),
            read_args: vec!["--read".to_string()],
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // diagnostics file (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub target: Target,
    #[serde(default)]
    pub offsets: Offsets,
    #[serde(default)]
    pub poll: Poll,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub tool: Tool,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_path(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()
        .map_err(|e| eyre::eyre!("invalid configuration in {:?}: {}", path, e))?;
    Ok(cfg)
}

fn check_offset(name: &str, v: f64) -> eyre::Result<()> {
    if !v.is_finite() || v.abs() > MAX_OFFSET_MV {
        eyre::bail!("offsets.{name} must be a finite value within +/-{MAX_OFFSET_MV} mV");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Target
        if !(1..=MAX_TEMP_TARGET).contains(&self.target.max_temp) {
            eyre::bail!("target.max_temp must be in [1, {MAX_TEMP_TARGET}]");
        }
        if !(1..=MAX_TEMP_TARGET).contains(&self.target.battery_temp()) {
            eyre::bail!(
                "target.max_temp + target.battery_delta must be in [1, {MAX_TEMP_TARGET}]"
            );
        }

        // Offsets
        check_offset("core", self.offsets.core)?;
        check_offset("cache", self.offsets.cache)?;
        check_offset("gpu", self.offsets.gpu)?;
        check_offset("uncore", self.offsets.uncore)?;

        // Poll
        if self.poll.fast_secs == 0 {
            eyre::bail!("poll.fast_secs must be >= 1");
        }
        if self.poll.base_secs < self.poll.fast_secs {
            eyre::bail!("poll.base_secs must be >= poll.fast_secs");
        }
        if self.poll.base_secs > 24 * 60 * 60 {
            eyre::bail!("poll.base_secs is unreasonably large (>24h)");
        }

        // Log
        if self.log.path.trim().is_empty() {
            eyre::bail!("log.path must not be empty");
        }
        if self.log.max_lines < 10 {
            eyre::bail!("log.max_lines must be >= 10");
        }

        // Tool
        if self.tool.program.trim().is_empty() {
            eyre::bail!("tool.program must not be empty");
        }
        if self.tool.timeout_ms == 0 {
            eyre::bail!("tool.timeout_ms must be >= 1");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = load_toml("[target]\nmax_temp = 98\n").expect("parse");
        assert_eq!(cfg.target.battery_delta, 0);
        assert_eq!(cfg.poll.base_secs, 60);
        assert_eq!(cfg.poll.fast_secs, 5);
        assert_eq!(cfg.log.max_lines, 1000);
        assert_eq!(cfg.tool.program, "undervolt");
        assert_eq!(cfg.tool.read_args, vec!["--read".to_string()]);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn battery_temp_applies_delta() {
        let t = Target {
            max_temp: 98,
            battery_delta: -5,
        };
        assert_eq!(t.battery_temp(), 93);
    }
}
