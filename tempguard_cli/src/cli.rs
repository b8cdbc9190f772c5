//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "tempguard",
    version,
    about = "Keeps the CPU temperature target where you set it"
)]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "/etc/tempguard.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor and correct the temperature target until stopped
    Run {
        /// Use simulated firmware instead of the hardware tool (no root needed)
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
        /// Stop after this many cycles
        #[arg(long, value_name = "N", hide = true)]
        max_cycles: Option<u64>,
    },
    /// Probe once and report whether the temperature target holds
    Check {
        /// Use simulated firmware instead of the hardware tool
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
    },
    /// Report how long the current fix has held, from the audit log
    History,
}
