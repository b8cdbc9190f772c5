//! Settings corrector: push the desired targets and offsets back to hardware.

use std::time::Duration;

use tempguard_traits::{AuxOffsets, TargetWriter, TuningRequest};

use crate::config::Targets;
use crate::error::CorrectionError;
use crate::hw_error::map_correction_error;

/// Write path of the hardware-control capability.
pub struct SettingsCorrector<W> {
    writer: W,
    targets: Targets,
    offsets: AuxOffsets,
    timeout: Duration,
}

impl<W: TargetWriter> SettingsCorrector<W> {
    pub fn new(writer: W, targets: Targets, offsets: AuxOffsets, timeout: Duration) -> Self {
        Self {
            writer,
            targets,
            offsets,
            timeout,
        }
    }

    /// The write every correction issues. Fixed for the process lifetime.
    pub fn request(&self) -> TuningRequest {
        TuningRequest {
            ac_target: self.targets.desired_max_temp,
            battery_target: self.targets.battery_target(),
            offsets: self.offsets,
        }
    }

    /// Apply the desired settings once. Idempotent; safe to retry every cycle.
    pub fn correct(&mut self) -> Result<TuningRequest, CorrectionError> {
        let req = self.request();
        self.writer
            .apply(&req, self.timeout)
            .map_err(|e| map_correction_error(e.as_ref()))?;
        tracing::info!(ac = req.ac_target, bat = req.battery_target, "settings applied");
        Ok(req)
    }
}
