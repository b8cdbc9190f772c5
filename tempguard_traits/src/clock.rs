use chrono::{Local, NaiveDateTime};

/// Wall-clock abstraction used for audit timestamps and history math.
///
/// Audit lines carry local civil time without a zone, so the clock hands out
/// `NaiveDateTime` in the host's local time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Default clock backed by the host's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::*;
    use chrono::TimeDelta;
    use std::sync::{Arc, Mutex};

    /// Deterministic clock whose time only moves when told to.
    ///
    /// Clones share the same underlying time, so a test can keep one handle
    /// and give another to the code under test.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        now: Arc<Mutex<NaiveDateTime>>,
    }

    impl ManualClock {
        pub fn new(start: NaiveDateTime) -> Self {
            Self {
                now: Arc::new(Mutex::new(start)),
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: TimeDelta) {
            if let Ok(mut now) = self.now.lock() {
                *now += d;
            }
        }

        /// Jump to an absolute time.
        pub fn set(&self, t: NaiveDateTime) {
            if let Ok(mut now) = self.now.lock() {
                *now = t;
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            self.now
                .lock()
                .map(|g| *g)
                .unwrap_or(NaiveDateTime::MIN)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::ManualClock;
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 4)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn manual_clock_advances_shared_time() {
        let clock = ManualClock::new(at(10, 0, 0));
        let handle = clock.clone();
        handle.advance(TimeDelta::seconds(90));
        assert_eq!(clock.now(), at(10, 1, 30));
    }
}
