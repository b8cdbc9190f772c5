pub mod error;
pub mod util;

use std::cell::RefCell;
use std::process::Command;
use std::rc::Rc;
use std::time::Duration;

use tempguard_traits::{AuxOffsets, BoxError, TargetReader, TargetWriter, TuningRequest};

use crate::error::HwError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Adapter for the `undervolt` command-line tool.
///
/// Reads run `program <read_args>`; writes run
/// `program --temp AC --temp-bat BAT --core C --cache C --gpu G --uncore U`.
#[derive(Debug, Clone)]
pub struct UndervoltTool {
    program: String,
    read_args: Vec<String>,
}

impl UndervoltTool {
    pub fn new(program: impl Into<String>, read_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            read_args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for a corrective write.
    pub fn write_args(request: &TuningRequest) -> Vec<String> {
        let o = &request.offsets;
        vec![
            "--temp".to_string(),
            request.ac_target.to_string(),
            "--temp-bat".to_string(),
            request.battery_target.to_string(),
            "--core".to_string(),
            o.core_mv.to_string(),
            "--cache".to_string(),
            o.cache_mv.to_string(),
            "--gpu".to_string(),
            o.gpu_mv.to_string(),
            "--uncore".to_string(),
            o.uncore_mv.to_string(),
        ]
    }

    fn invoke(&self, args: &[String], timeout: Duration) -> error::Result<String> {
        let done = util::run_with_timeout(
            Command::new(&self.program).args(args),
            timeout,
            POLL_INTERVAL,
        )?;
        if !done.status.success() {
            let stderr = done.stderr.trim().to_string();
            let lower = stderr.to_ascii_lowercase();
            if lower.contains("permission denied") || lower.contains("operation not permitted") {
                return Err(HwError::PermissionDenied {
                    program: self.program.clone(),
                });
            }
            return Err(HwError::Exit {
                program: self.program.clone(),
                code: done.status.code(),
                stderr,
            });
        }
        Ok(done.stdout)
    }
}

impl TargetReader for UndervoltTool {
    fn read_report(&mut self, timeout: Duration) -> Result<String, BoxError> {
        let out = self.invoke(&self.read_args, timeout)?;
        tracing::trace!(program = %self.program, bytes = out.len(), "read report");
        Ok(out)
    }
}

impl TargetWriter for UndervoltTool {
    fn apply(&mut self, request: &TuningRequest, timeout: Duration) -> Result<(), BoxError> {
        let args = Self::write_args(request);
        tracing::debug!(program = %self.program, ?args, "applying settings");
        self.invoke(&args, timeout)?;
        Ok(())
    }
}

#[derive(Debug)]
struct SimState {
    current: i32,
    firmware_default: i32,
    reset_every: Option<u32>,
    reads: u32,
    writes: u32,
    offsets: AuxOffsets,
}

/// Simulated firmware for dry runs.
///
/// Clones share one state, so one clone can serve as reader and another as
/// writer. Every `reset_every` reads the firmware reverts the temperature
/// target to its default.
#[derive(Debug, Clone)]
pub struct SimulatedTuner {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedTuner {
    pub fn new(initial: i32) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                current: initial,
                firmware_default: initial,
                reset_every: None,
                reads: 0,
                writes: 0,
                offsets: AuxOffsets::default(),
            })),
        }
    }

    /// Revert to the initial value on every `n`th read (0 disables).
    pub fn with_reset_every(self, n: u32) -> Self {
        self.state.borrow_mut().reset_every = (n > 0).then_some(n);
        self
    }

    pub fn current(&self) -> i32 {
        self.state.borrow().current
    }

    pub fn writes(&self) -> u32 {
        self.state.borrow().writes
    }
}

impl TargetReader for SimulatedTuner {
    fn read_report(&mut self, _timeout: Duration) -> Result<String, BoxError> {
        let mut s = self.state.borrow_mut();
        s.reads = s.reads.saturating_add(1);
        if let Some(n) = s.reset_every
            && s.reads % n == 0
        {
            tracing::info!(from = s.current, to = s.firmware_default, "simulated firmware reset");
            s.current = s.firmware_default;
        }
        Ok(format!(
            "temperature target: {} ({}C)\ncore: {:.2} mV\ngpu: {:.2} mV\ncache: {:.2} mV\nuncore: {:.2} mV\n",
            s.current - 100,
            s.current,
            s.offsets.core_mv,
            s.offsets.gpu_mv,
            s.offsets.cache_mv,
            s.offsets.uncore_mv,
        ))
    }
}

impl TargetWriter for SimulatedTuner {
    fn apply(&mut self, request: &TuningRequest, _timeout: Duration) -> Result<(), BoxError> {
        let mut s = self.state.borrow_mut();
        s.current = request.ac_target;
        s.offsets = request.offsets;
        s.writes = s.writes.saturating_add(1);
        tracing::debug!(ac = request.ac_target, bat = request.battery_target, "simulated apply");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TuningRequest {
        TuningRequest {
            ac_target: 98,
            battery_target: 93,
            offsets: AuxOffsets {
                core_mv: -110.0,
                cache_mv: -110.0,
                gpu_mv: -80.5,
                uncore_mv: -50.0,
            },
        }
    }

    #[test]
    fn write_args_carry_both_targets_and_offsets() {
        let args = UndervoltTool::write_args(&request());
        assert_eq!(
            args,
            [
                "--temp", "98", "--temp-bat", "93", "--core", "-110", "--cache", "-110", "--gpu",
                "-80.5", "--uncore", "-50"
            ]
        );
    }

    #[test]
    fn simulated_tuner_applies_and_resets() {
        let mut reader = SimulatedTuner::new(80).with_reset_every(3);
        let mut writer = reader.clone();
        let t = Duration::from_millis(1);

        assert!(reader.read_report(t).unwrap().contains("(80C)"));
        writer.apply(&request(), t).unwrap();
        assert_eq!(reader.current(), 98);
        assert!(reader.read_report(t).unwrap().contains("(98C)"));
        // third read trips the simulated firmware reset
        assert!(reader.read_report(t).unwrap().contains("(80C)"));
        assert_eq!(writer.writes(), 1);
    }
}
