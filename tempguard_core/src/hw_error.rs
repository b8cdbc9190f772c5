//! Maps `Box<dyn Error>` from trait boundaries to typed probe/correction errors.
//!
//! The traits in `tempguard_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed enums, with an optional feature-gated path
//! for `tempguard_hardware::HwError` downcasting.

use crate::error::{CorrectionError, ProbeError};

/// Failure class shared by both directions of the capability.
enum Kind {
    Timeout,
    Denied(String),
    Other(String),
}

fn classify(e: &(dyn std::error::Error + 'static)) -> Kind {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        use tempguard_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout { .. } => Kind::Timeout,
                HwError::PermissionDenied { .. } => Kind::Denied(hw.to_string()),
                other => Kind::Other(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        Kind::Timeout
    } else if lower.contains("permission denied") || lower.contains("not permitted") {
        Kind::Denied(s)
    } else {
        Kind::Other(s)
    }
}

/// Map a read-side error to a typed `ProbeError`.
pub fn map_probe_error(e: &(dyn std::error::Error + 'static)) -> ProbeError {
    match classify(e) {
        Kind::Timeout => ProbeError::Timeout,
        Kind::Denied(s) => ProbeError::PermissionDenied(s),
        Kind::Other(s) => ProbeError::Unreachable(s),
    }
}

/// Map a write-side error to a typed `CorrectionError`.
pub fn map_correction_error(e: &(dyn std::error::Error + 'static)) -> CorrectionError {
    match classify(e) {
        Kind::Timeout => CorrectionError::Timeout,
        Kind::Denied(s) => CorrectionError::PermissionDenied(s),
        Kind::Other(s) => CorrectionError::Failed(s),
    }
}
