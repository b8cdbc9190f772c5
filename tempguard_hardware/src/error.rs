use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("{program}: not found")]
    NotFound { program: String },
    #[error("{program}: permission denied")]
    PermissionDenied { program: String },
    #[error("{program}: timeout after {after_ms} ms")]
    Timeout { program: String, after_ms: u64 },
    #[error("{program}: exited with {}: {stderr}", exit_label(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
