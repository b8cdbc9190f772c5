//! Subcommand bodies: wire config and hardware into the core.

use std::process::ExitCode;

use eyre::WrapErr;
use serde_json::json;
use tempguard_config::Config;
use tempguard_core::{
    Classification, Daemon, LogStore, PollCfg, SettingsProbe, StopReason, Targets, Timeouts,
    analyze_store,
};
use tempguard_core::conversions::aux_offsets;
use tempguard_hardware::{SimulatedTuner, UndervoltTool};
use tempguard_traits::{Clock, SystemClock, TargetReader, TargetWriter};

use crate::cli::JSON_MODE;
use crate::privilege::require_root;

/// Exit status of `check` when the temperature target has drifted.
pub const EXIT_DRIFTED: u8 = 5;

fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

fn env_num<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Reader/writer pair: the real tool, or shared simulated firmware.
fn hardware(cfg: &Config, simulate: bool) -> (Box<dyn TargetReader>, Box<dyn TargetWriter>) {
    if simulate {
        let initial = env_num::<i32>("TEMPGUARD_SIM_INITIAL").unwrap_or(80);
        let reset_every = env_num::<u32>("TEMPGUARD_SIM_RESET_EVERY").unwrap_or(0);
        tracing::info!(initial, reset_every, "using simulated firmware");
        let sim = SimulatedTuner::new(initial).with_reset_every(reset_every);
        (Box::new(sim.clone()), Box::new(sim))
    } else {
        let tool = UndervoltTool::new(cfg.tool.program.clone(), cfg.tool.read_args.clone());
        (Box::new(tool.clone()), Box::new(tool))
    }
}

pub fn run(cfg: &Config, simulate: bool, max_cycles: Option<u64>) -> eyre::Result<ExitCode> {
    if !simulate {
        require_root()?;
    }

    let (tx, rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        // A full channel already carries a pending stop.
        let _ = tx.try_send(());
    })
    .wrap_err("install stop-signal handler")?;

    let (reader, writer) = hardware(cfg, simulate);
    let mut daemon = Daemon::builder()
        .with_reader(reader)
        .with_writer(writer)
        .with_store(LogStore::from(&cfg.log))
        .with_targets(Targets::from(&cfg.target))
        .with_offsets(aux_offsets(&cfg.offsets))
        .with_poll(PollCfg::from(&cfg.poll))
        .with_timeouts(Timeouts::from(&cfg.tool))
        .build()?;

    let reason = daemon.run(&rx, max_cycles);
    if json_mode() {
        println!(
            "{}",
            json!({ "stopped": format!("{reason:?}"), "cycles": daemon.cycles() })
        );
    } else {
        match reason {
            StopReason::Signal => println!("stopped by signal after {} cycles", daemon.cycles()),
            StopReason::CycleLimit => println!("completed {} cycles", daemon.cycles()),
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn check(cfg: &Config, simulate: bool) -> eyre::Result<ExitCode> {
    if !simulate {
        require_root()?;
    }
    let targets = Targets::from(&cfg.target);
    let (reader, _writer) = hardware(cfg, simulate);
    let mut probe = SettingsProbe::new(reader, Timeouts::from(&cfg.tool).tool);

    let observation = probe.probe();
    let classification = targets.classify(observation.as_ref().ok().copied());
    let state = match classification {
        Classification::Correct => "correct",
        Classification::Incorrect => "incorrect",
    };

    if json_mode() {
        let obj = match &observation {
            Ok(v) => json!({
                "state": state,
                "value": v,
                "desired": targets.desired_max_temp,
                "battery": targets.battery_target(),
            }),
            Err(e) => json!({ "state": state, "error": e.to_string() }),
        };
        println!("{obj}");
    } else {
        match &observation {
            Ok(v) => println!(
                "temperature target {v}C: {state} (desired {}C, battery {}C)",
                targets.desired_max_temp,
                targets.battery_target()
            ),
            Err(e) => println!("probe failed: {e}: {state}"),
        }
    }

    Ok(if classification.is_correct() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DRIFTED)
    })
}

pub fn history(cfg: &Config) -> eyre::Result<ExitCode> {
    let store = LogStore::from(&cfg.log);
    let report = analyze_store(&store, SystemClock::new().now())?;
    if json_mode() {
        let obj = match report {
            tempguard_core::HistoryReport::Held {
                since,
                elapsed,
                drifted_at,
            } => json!({
                "held_secs": elapsed.num_seconds(),
                "since": since.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "drifted_at": drifted_at.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
            }),
            tempguard_core::HistoryReport::InsufficientData => {
                json!({ "held_secs": null, "message": "insufficient data" })
            }
        };
        println!("{obj}");
    } else {
        println!("{report}");
    }
    Ok(ExitCode::SUCCESS)
}
