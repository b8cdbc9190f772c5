use thiserror::Error;

/// Why a probe produced no observation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("hardware tool unreachable: {0}")]
    Unreachable(String),
    #[error("hardware tool timed out")]
    Timeout,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("no temperature target in tool output: {0}")]
    Unparsable(String),
}

/// Why a corrective write did not take.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorrectionError {
    #[error("write failed: {0}")]
    Failed(String),
    #[error("write timed out")]
    Timeout,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("log {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing target reader")]
    MissingReader,
    #[error("missing target writer")]
    MissingWriter,
    #[error("missing log store")]
    MissingStore,
    #[error("missing temperature targets")]
    MissingTargets,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
