//! Human-readable error descriptions and structured JSON error formatting.

use crate::privilege::StartupError;

/// Exit status for a missing-privilege startup failure.
pub const EXIT_NO_PRIVILEGE: u8 = 3;
/// Exit status for an unreadable or invalid configuration.
pub const EXIT_BAD_CONFIG: u8 = 4;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use tempguard_core::error::{BuildError, StoreError};

    // Typed matches first
    if let Some(se) = err.downcast_ref::<StartupError>() {
        return match se {
            StartupError::MissingPrivilege { euid } => format!(
                "What happened: tempguard is not running as root (effective uid {euid}).\nLikely causes: Started from a user shell or a service unit without root.\nHow to fix: Run via sudo or a root service unit, or pass --simulate for a dry run."
            ),
            StartupError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing [target] section or out-of-range values in the TOML.\nHow to fix: Edit the config file, then restart."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: The control loop could not be assembled ({be}).\nLikely causes: Inconsistent poll intervals or log bounds.\nHow to fix: Check [poll] and [log] in the config."
        );
    }

    if let Some(StoreError::Io { path, source }) = err.downcast_ref::<StoreError>() {
        return format!(
            "What happened: The audit log {path} could not be read ({source}).\nLikely causes: Wrong [log] path or missing read permission.\nHow to fix: Check log.path in the config and its permissions."
        );
    }

    // String-based heuristics for errors coming from init
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("stop-signal handler") {
        return "What happened: Could not install the stop-signal handler.\nLikely causes: Another handler is already registered in this process.\nHow to fix: Re-run; report a bug if it persists.".to_string();
    }

    if lower.contains("init tracing") || lower.contains("invalid log level") {
        return format!(
            "What happened: Diagnostics could not be set up ({msg}).\nLikely causes: Bad --log-level / RUST_LOG value or unwritable logging.file.\nHow to fix: Use one of error|warn|info|debug|trace and check [logging] in the config."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map startup failures to stable exit codes; anything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> u8 {
    match err.downcast_ref::<StartupError>() {
        Some(StartupError::MissingPrivilege { .. }) => EXIT_NO_PRIVILEGE,
        Some(StartupError::Config(_)) => EXIT_BAD_CONFIG,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<StartupError>() {
        Some(StartupError::MissingPrivilege { .. }) => "MissingPrivilege",
        Some(StartupError::Config(_)) => "InvalidConfig",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
