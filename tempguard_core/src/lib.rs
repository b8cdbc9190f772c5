#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core temperature-target enforcement (hardware-agnostic).
//!
//! All hardware interaction goes through `tempguard_traits::TargetReader` and
//! `tempguard_traits::TargetWriter`.
//!
//! ## Architecture
//!
//! - **Log store**: append-only audit log with front trimming (`log_store`)
//! - **Probe**: tool report → effective temperature target (`probe`)
//! - **Corrector**: desired targets + offsets → tool write (`corrector`)
//! - **Drift detection**: `Correct` / `Incorrect` classification (`drift`)
//! - **History**: time since the last incorrect→correct transition (`history`)
//! - **Scheduling**: two-phase poll cadence and the loop itself (`phase`, `daemon`)

pub mod atomic;
pub mod config;
pub mod conversions;
pub mod corrector;
pub mod daemon;
pub mod drift;
pub mod error;
pub mod history;
pub mod hw_error;
pub mod log_store;
pub mod mocks;
pub mod phase;
pub mod probe;
pub mod rev_lines;

pub use config::{PollCfg, Targets, Timeouts};
pub use daemon::{CycleReport, Daemon, DaemonBuilder, StopReason};
pub use drift::{Classification, classify};
pub use error::{BuildError, CorrectionError, ProbeError, StoreError};
pub use history::{HistoryReport, analyze, analyze_store, format_elapsed};
pub use log_store::{LogEntry, LogStore, Tag};
pub use phase::Phase;
pub use probe::{SettingsProbe, parse_temp_target};
