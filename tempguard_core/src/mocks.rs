//! Test and helper fakes for tempguard_core

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use tempguard_traits::{BoxError, TargetReader, TargetWriter, TuningRequest};

/// A reader that replays scripted reports; `Err` entries become read failures.
/// Once the script runs dry the last entry repeats.
#[derive(Debug, Clone, Default)]
pub struct ScriptedReader {
    script: VecDeque<std::result::Result<String, String>>,
    last: Option<std::result::Result<String, String>>,
}

impl ScriptedReader {
    /// Script of temperature-target values rendered in `undervolt` style.
    pub fn values(values: &[i32]) -> Self {
        Self::reports(
            values
                .iter()
                .map(|v| Ok(format!("temperature target: {} ({v}C)\n", v - 100))),
        )
    }

    pub fn reports(items: impl IntoIterator<Item = std::result::Result<String, String>>) -> Self {
        Self {
            script: items.into_iter().collect(),
            last: None,
        }
    }
}

impl TargetReader for ScriptedReader {
    fn read_report(&mut self, _timeout: Duration) -> Result<String, BoxError> {
        if let Some(next) = self.script.pop_front() {
            self.last = Some(next);
        }
        match &self.last {
            Some(Ok(s)) => Ok(s.clone()),
            Some(Err(e)) => Err(Box::new(std::io::Error::other(e.clone()))),
            None => Err(Box::new(std::io::Error::other("empty script"))),
        }
    }
}

/// A writer that records every request; clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingWriter {
    calls: Rc<RefCell<Vec<TuningRequest>>>,
    fail_with: Option<String>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every apply records the request and then fails with `msg`.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            calls: Rc::default(),
            fail_with: Some(msg.into()),
        }
    }

    pub fn calls(&self) -> Vec<TuningRequest> {
        self.calls.borrow().clone()
    }
}

impl TargetWriter for RecordingWriter {
    fn apply(&mut self, request: &TuningRequest, _timeout: Duration) -> Result<(), BoxError> {
        self.calls.borrow_mut().push(*request);
        match &self.fail_with {
            Some(msg) => Err(Box::new(std::io::Error::other(msg.clone()))),
            None => Ok(()),
        }
    }
}
