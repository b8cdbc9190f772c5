//! Adaptive poll cadence as a two-state machine.

use std::time::Duration;

use crate::config::PollCfg;
use crate::drift::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Last observation was correct; poll at the base interval.
    #[default]
    Steady,
    /// Just corrected; poll fast to confirm the write held.
    Settling,
}

impl Phase {
    /// Transition on one classification. The current phase does not matter:
    /// any incorrect reading settles, any correct reading ends settling.
    #[inline]
    pub fn next(self, c: Classification) -> Phase {
        match c {
            Classification::Incorrect => Phase::Settling,
            Classification::Correct => Phase::Steady,
        }
    }

    #[inline]
    pub fn interval(self, poll: &PollCfg) -> Duration {
        match self {
            Phase::Steady => poll.base,
            Phase::Settling => poll.fast,
        }
    }
}
