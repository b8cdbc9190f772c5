//! The monitoring/correction loop and its builder.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tempguard_traits::clock::{Clock, SystemClock};
use tempguard_traits::{AuxOffsets, TargetReader, TargetWriter, TuningRequest};

use crate::config::{PollCfg, Targets, Timeouts};
use crate::corrector::SettingsCorrector;
use crate::drift::Classification;
use crate::error::{BuildError, CorrectionError, ProbeError, Result, StoreError};
use crate::history::{HistoryReport, analyze_store};
use crate::log_store::{LogEntry, LogStore, Tag};
use crate::phase::Phase;
use crate::probe::SettingsProbe;

/// Everything one cycle observed and did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub observation: std::result::Result<i32, ProbeError>,
    pub classification: Classification,
    /// `None` when no correction was needed.
    pub correction: Option<std::result::Result<TuningRequest, CorrectionError>>,
    /// `None` when the audit log could not be read.
    pub history: Option<HistoryReport>,
    pub phase: Phase,
    pub next_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stop requested through the shutdown channel (or its sender went away).
    Signal,
    /// The optional cycle bound was reached.
    CycleLimit,
}

/// Audit-log operations whose failures are tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogOp {
    Append,
    Scan,
    Trim,
}

impl LogOp {
    fn as_str(self) -> &'static str {
        match self {
            LogOp::Append => "write",
            LogOp::Scan => "history scan",
            LogOp::Trim => "trim",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FailureStreak {
    failing: bool,
    /// Number of streaks begun so far.
    started: u64,
}

impl FailureStreak {
    /// True when this failure opens a new streak.
    fn fail(&mut self) -> bool {
        if self.failing {
            return false;
        }
        self.failing = true;
        self.started = self.started.saturating_add(1);
        true
    }

    /// True when this success closes a streak.
    fn recover(&mut self) -> bool {
        std::mem::replace(&mut self.failing, false)
    }
}

pub struct Daemon {
    probe: SettingsProbe<Box<dyn TargetReader>>,
    corrector: SettingsCorrector<Box<dyn TargetWriter>>,
    store: LogStore,
    targets: Targets,
    poll: PollCfg,
    clock: Box<dyn Clock>,
    phase: Phase,
    append_streak: FailureStreak,
    scan_streak: FailureStreak,
    trim_streak: FailureStreak,
    cycles: u64,
}

impl core::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Daemon")
            .field("targets", &self.targets)
            .field("poll", &self.poll)
            .field("log", &self.store.path())
            .field("phase", &self.phase)
            .field("cycles", &self.cycles)
            .finish()
    }
}

impl Daemon {
    pub fn builder() -> DaemonBuilder {
        DaemonBuilder::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Append to the audit log. A failed append never interrupts the loop.
    fn record(&mut self, tag: Tag, message: String) {
        let entry = LogEntry::new(self.clock.now(), tag, message);
        let result = self.store.append(&entry);
        self.track(LogOp::Append, result);
    }

    /// Report store failures once per streak of the same operation, and once
    /// more when that operation works again.
    fn track<T>(&mut self, op: LogOp, result: std::result::Result<T, StoreError>) -> Option<T> {
        let streak = match op {
            LogOp::Append => &mut self.append_streak,
            LogOp::Scan => &mut self.scan_streak,
            LogOp::Trim => &mut self.trim_streak,
        };
        match result {
            Ok(v) => {
                if streak.recover() {
                    tracing::info!(path = %self.store.path().display(), "audit log {} working again", op.as_str());
                }
                Some(v)
            }
            Err(e) => {
                if streak.fail() {
                    tracing::error!(error = %e, "audit log {} failed; control loop continues", op.as_str());
                }
                None
            }
        }
    }

    /// One probe → classify → correct → log → history → trim pass.
    pub fn cycle(&mut self) -> CycleReport {
        self.cycles = self.cycles.saturating_add(1);
        let desired = self.targets.desired_max_temp;
        let battery = self.targets.battery_target();

        let observation = self.probe.probe();
        let classification = self.targets.classify(observation.as_ref().ok().copied());

        let marker = match &observation {
            Ok(v) if classification.is_correct() => {
                tracing::debug!(value = v, "temperature target holds");
                format!("temperature target {v}C matches desired")
            }
            Ok(v) => {
                tracing::warn!(value = v, desired, battery, "temperature target drifted");
                format!("temperature target {v}C, expected {desired}C or {battery}C")
            }
            Err(e) => {
                tracing::warn!(error = %e, "probe failed; treating as incorrect");
                format!("probe failed: {e}")
            }
        };
        self.record(classification.into(), marker);

        let correction = (!classification.is_correct()).then(|| {
            let result = self.corrector.correct();
            match &result {
                Ok(req) => {
                    let o = req.offsets;
                    self.record(
                        Tag::Applied,
                        format!(
                            "ac={} bat={} core={} cache={} gpu={} uncore={}",
                            req.ac_target,
                            req.battery_target,
                            o.core_mv,
                            o.cache_mv,
                            o.gpu_mv,
                            o.uncore_mv
                        ),
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "correction failed; retrying next cycle");
                    self.record(Tag::ApplyFailed, e.to_string());
                }
            }
            result
        });

        let scanned = analyze_store(&self.store, self.clock.now());
        let history = self.track(LogOp::Scan, scanned);
        if let Some(h) = &history {
            tracing::debug!(history = %h, "history analyzed");
            self.record(Tag::History, h.to_string());
        }

        let trimmed = self.store.trim();
        self.track(LogOp::Trim, trimmed);

        self.phase = self.phase.next(classification);
        let next_interval = self.phase.interval(&self.poll);
        tracing::debug!(phase = ?self.phase, next_secs = next_interval.as_secs(), "cycle done");

        CycleReport {
            observation,
            classification,
            correction,
            history,
            phase: self.phase,
            next_interval,
        }
    }

    /// Cycle until `shutdown` fires. Only the inter-cycle wait is interruptible;
    /// a cycle in progress always completes.
    pub fn run(&mut self, shutdown: &Receiver<()>, max_cycles: Option<u64>) -> StopReason {
        let poll = self.poll;
        self.record(
            Tag::Start,
            format!(
                "monitoring: desired {}C (battery {}C), poll {}s/{}s",
                self.targets.desired_max_temp,
                self.targets.battery_target(),
                poll.base.as_secs(),
                poll.fast.as_secs()
            ),
        );
        tracing::info!(
            desired = self.targets.desired_max_temp,
            battery = self.targets.battery_target(),
            base_secs = poll.base.as_secs(),
            fast_secs = poll.fast.as_secs(),
            "control loop started"
        );

        let reason = loop {
            let report = self.cycle();
            if max_cycles.is_some_and(|n| self.cycles >= n) {
                break StopReason::CycleLimit;
            }
            match shutdown.recv_timeout(report.next_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break StopReason::Signal,
            }
        };

        self.record(Tag::Stop, format!("stopped after {} cycles", self.cycles));
        tracing::info!(cycles = self.cycles, ?reason, "control loop stopped");
        reason
    }
}

/// Builder for `Daemon`. All fields are validated on `build()`.
#[derive(Default)]
pub struct DaemonBuilder {
    reader: Option<Box<dyn TargetReader>>,
    writer: Option<Box<dyn TargetWriter>>,
    store: Option<LogStore>,
    targets: Option<Targets>,
    offsets: Option<AuxOffsets>,
    poll: Option<PollCfg>,
    timeouts: Option<Timeouts>,
    clock: Option<Box<dyn Clock>>,
}

impl DaemonBuilder {
    pub fn with_reader(mut self, reader: impl TargetReader + 'static) -> Self {
        self.reader = Some(Box::new(reader));
        self
    }

    pub fn with_writer(mut self, writer: impl TargetWriter + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    pub fn with_store(mut self, store: LogStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_targets(mut self, targets: Targets) -> Self {
        self.targets = Some(targets);
        self
    }

    pub fn with_offsets(mut self, offsets: AuxOffsets) -> Self {
        self.offsets = Some(offsets);
        self
    }

    pub fn with_poll(mut self, poll: PollCfg) -> Self {
        self.poll = Some(poll);
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn build(self) -> Result<Daemon> {
        let reader = self
            .reader
            .ok_or_else(|| eyre::Report::new(BuildError::MissingReader))?;
        let writer = self
            .writer
            .ok_or_else(|| eyre::Report::new(BuildError::MissingWriter))?;
        let store = self
            .store
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStore))?;
        let targets = self
            .targets
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTargets))?;
        let poll = self.poll.unwrap_or_default();
        let timeouts = self.timeouts.unwrap_or_default();

        let valid = 1..=tempguard_config::MAX_TEMP_TARGET;
        if !valid.contains(&targets.desired_max_temp) || !valid.contains(&targets.battery_target()) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "temperature targets must be within 1..=127 C",
            )));
        }
        if poll.fast.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "fast poll interval must be > 0",
            )));
        }
        if poll.base < poll.fast {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "base poll interval must be >= fast poll interval",
            )));
        }
        if store.max_lines() == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "max log lines must be >= 1",
            )));
        }
        if timeouts.tool.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "tool timeout must be > 0",
            )));
        }

        Ok(Daemon {
            probe: SettingsProbe::new(reader, timeouts.tool),
            corrector: SettingsCorrector::new(
                writer,
                targets,
                self.offsets.unwrap_or_default(),
                timeouts.tool,
            ),
            store,
            targets,
            poll,
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock::new())),
            phase: Phase::Steady,
            append_streak: FailureStreak::default(),
            scan_streak: FailureStreak::default(),
            trim_streak: FailureStreak::default(),
            cycles: 0,
        })
    }
}
