//! Startup preconditions: privilege and configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("must run as root to access CPU MSRs (effective uid {euid})")]
    MissingPrivilege { euid: u32 },
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[inline]
pub fn effective_uid() -> u32 {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() }
}

/// Fail unless running with an effective uid of 0.
pub fn require_root() -> Result<(), StartupError> {
    let euid = effective_uid();
    if euid != 0 {
        return Err(StartupError::MissingPrivilege { euid });
    }
    Ok(())
}
