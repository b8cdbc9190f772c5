pub mod clock;

pub use clock::{Clock, SystemClock};

use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Auxiliary undervolt offsets in millivolts. Opaque to the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AuxOffsets {
    pub core_mv: f64,
    pub cache_mv: f64,
    pub gpu_mv: f64,
    pub uncore_mv: f64,
}

/// One corrective write: both temperature targets plus the fixed offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningRequest {
    pub ac_target: i32,
    pub battery_target: i32,
    pub offsets: AuxOffsets,
}

/// Read side of the hardware-control capability.
///
/// Returns the tool's raw report; locating the temperature-target field is the
/// caller's job.
pub trait TargetReader {
    fn read_report(&mut self, timeout: Duration) -> Result<String, BoxError>;
}

/// Write side of the hardware-control capability.
pub trait TargetWriter {
    fn apply(&mut self, request: &TuningRequest, timeout: Duration) -> Result<(), BoxError>;
}

impl<T: TargetReader + ?Sized> TargetReader for Box<T> {
    fn read_report(&mut self, timeout: Duration) -> Result<String, BoxError> {
        (**self).read_report(timeout)
    }
}

impl<T: TargetWriter + ?Sized> TargetWriter for Box<T> {
    fn apply(&mut self, request: &TuningRequest, timeout: Duration) -> Result<(), BoxError> {
        (**self).apply(request, timeout)
    }
}
