//! `From` implementations bridging `tempguard_config` types to `tempguard_core` types.

use std::time::Duration;

use tempguard_traits::AuxOffsets;

use crate::config::{PollCfg, Targets, Timeouts};
use crate::log_store::LogStore;

// ── Targets ──────────────────────────────────────────────────────────────────

impl From<&tempguard_config::Target> for Targets {
    fn from(c: &tempguard_config::Target) -> Self {
        Self {
            desired_max_temp: c.max_temp,
            battery_delta: c.battery_delta,
        }
    }
}

// ── AuxOffsets ───────────────────────────────────────────────────────────────

/// Both sides are foreign to this crate, hence a plain function.
pub fn aux_offsets(c: &tempguard_config::Offsets) -> AuxOffsets {
    AuxOffsets {
        core_mv: c.core,
        cache_mv: c.cache,
        gpu_mv: c.gpu,
        uncore_mv: c.uncore,
    }
}

// ── PollCfg ──────────────────────────────────────────────────────────────────

impl From<&tempguard_config::Poll> for PollCfg {
    fn from(c: &tempguard_config::Poll) -> Self {
        Self {
            base: Duration::from_secs(c.base_secs),
            fast: Duration::from_secs(c.fast_secs),
        }
    }
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

impl From<&tempguard_config::Tool> for Timeouts {
    fn from(c: &tempguard_config::Tool) -> Self {
        Self {
            tool: Duration::from_millis(c.timeout_ms),
        }
    }
}

// ── LogStore ─────────────────────────────────────────────────────────────────

impl From<&tempguard_config::Log> for LogStore {
    fn from(c: &tempguard_config::Log) -> Self {
        LogStore::new(&c.path, c.max_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_a_loaded_config() {
        let cfg = tempguard_config::load_toml(
            "[target]\nmax_temp = 98\nbattery_delta = -5\n[poll]\nbase_secs = 30\nfast_secs = 3\n[offsets]\ngpu = -80.0\n",
        )
        .unwrap();
        let targets = Targets::from(&cfg.target);
        assert_eq!(targets.battery_target(), 93);
        let poll = PollCfg::from(&cfg.poll);
        assert_eq!(poll.base, Duration::from_secs(30));
        assert_eq!(poll.fast, Duration::from_secs(3));
        assert_eq!(aux_offsets(&cfg.offsets).gpu_mv, -80.0);
        assert_eq!(aux_offsets(&cfg.offsets).core_mv, 0.0);
        assert_eq!(Timeouts::from(&cfg.tool).tool, Duration::from_secs(10));
        assert_eq!(LogStore::from(&cfg.log).max_lines(), 1000);
    }
}
