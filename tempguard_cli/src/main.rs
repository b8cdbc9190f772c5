#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod commands;
mod error_fmt;
mod logging;
mod privilege;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::privilege::StartupError;

fn real_main(cli: Cli) -> eyre::Result<ExitCode> {
    // Config problems are fatal before anything else starts.
    let cfg = tempguard_config::load_path(&cli.config)
        .map_err(|e| StartupError::Config(e.to_string()))?;

    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    match cli.cmd {
        Commands::Run {
            simulate,
            max_cycles,
        } => commands::run(&cfg, simulate, max_cycles),
        Commands::Check { simulate } => commands::check(&cfg, simulate),
        Commands::History => commands::history(&cfg),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    match real_main(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "fatal");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            ExitCode::from(exit_code_for_error(&err))
        }
    }
}
