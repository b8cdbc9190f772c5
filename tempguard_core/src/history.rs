//! How long has the current fix held?
//!
//! Walks the audit log newest-first and stops at the most recent `[CORRECT]`
//! marker whose previous marker is `[INCORRECT]`. Non-marker lines are skipped.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};

use crate::drift::Classification;
use crate::error::StoreError;
use crate::log_store::{LogStore, parse_line};

const STAMP: &str = "%b %e %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryReport {
    /// The most recent incorrect→correct transition happened at `since`, and
    /// `elapsed` runs from there to now.
    ///
    /// `drifted_at` is set when newer `[INCORRECT]` markers follow that fix: the
    /// fix is broken, and it names the first drift after it. `elapsed` still
    /// counts up to now.
    Held {
        since: NaiveDateTime,
        elapsed: TimeDelta,
        drifted_at: Option<NaiveDateTime>,
    },
    /// No `[INCORRECT]` marker precedes any `[CORRECT]` marker.
    InsufficientData,
}

impl fmt::Display for HistoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryReport::Held {
                since,
                elapsed,
                drifted_at: None,
            } => write!(
                f,
                "fix has held for {} (since {})",
                format_elapsed(*elapsed),
                since.format(STAMP)
            ),
            HistoryReport::Held {
                since,
                drifted_at: Some(drift),
                ..
            } => write!(
                f,
                "drifted at {}; previous fix held for {} (since {})",
                drift.format(STAMP),
                format_elapsed(*drift - *since),
                since.format(STAMP)
            ),
            HistoryReport::InsufficientData => f.write_str("insufficient data"),
        }
    }
}

/// `1d 02h 03m 04s`, dropping leading zero units.
pub fn format_elapsed(d: TimeDelta) -> String {
    let total = d.num_seconds().max(0);
    let (days, rem) = (total / 86_400, total % 86_400);
    let (h, m, s) = (rem / 3600, (rem % 3600) / 60, rem % 60);
    if days > 0 {
        format!("{days}d {h:02}h {m:02}m {s:02}s")
    } else if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

/// Scan `lines` (newest first) and compute the report relative to `now`.
///
/// Lines that do not parse as log entries are skipped.
pub fn analyze<I, S>(lines: I, now: NaiveDateTime) -> HistoryReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    // Oldest `[CORRECT]` of the newest unbroken run of correct markers.
    let mut candidate: Option<NaiveDateTime> = None;
    // Oldest `[INCORRECT]` newer than every `[CORRECT]` seen.
    let mut drifted_at: Option<NaiveDateTime> = None;
    for line in lines {
        let Some(parsed) = parse_line(line.as_ref(), now) else {
            continue;
        };
        match parsed.tag.and_then(|t| t.marker()) {
            Some(Classification::Correct) => candidate = Some(parsed.timestamp),
            Some(Classification::Incorrect) => {
                let Some(since) = candidate else {
                    drifted_at = Some(parsed.timestamp);
                    continue;
                };
                let elapsed = (now - since).max(TimeDelta::zero());
                return HistoryReport::Held {
                    since,
                    elapsed,
                    drifted_at,
                };
            }
            None => {}
        }
    }
    HistoryReport::InsufficientData
}

/// Run the analysis directly over the store.
pub fn analyze_store(store: &LogStore, now: NaiveDateTime) -> Result<HistoryReport, StoreError> {
    let mut failure = None;
    let lines = store.rev_lines()?.map_while(|r| match r {
        Ok(l) => Some(l),
        Err(e) => {
            failure = Some(e);
            None
        }
    });
    let report = analyze(lines, now);
    if let Some(e) = failure {
        tracing::warn!(error = %e, "audit log scan stopped early");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 14)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    fn rev(lines: &[&str]) -> Vec<String> {
        lines.iter().rev().map(|s| s.to_string()).collect()
    }

    #[test]
    fn elapsed_since_first_correct_after_incorrect() {
        let log = rev(&[
            "Oct 14 10:00:00 [CORRECT] 98C",
            "Oct 14 10:01:00 [INCORRECT] 80C",
            "Oct 14 10:01:00 [APPLIED] ac=98 bat=93",
            "Oct 14 10:01:05 [CORRECT] 98C",
            "Oct 14 10:02:05 [HISTORY] ...",
            "Oct 14 10:03:05 [CORRECT] 98C",
        ]);
        let report = analyze(&log, at(11, 1, 5));
        assert_eq!(
            report,
            HistoryReport::Held {
                since: at(10, 1, 5),
                elapsed: TimeDelta::hours(1),
                drifted_at: None,
            }
        );
        assert_eq!(report.to_string(), "fix has held for 1h 00m 00s (since Oct 14 10:01:05)");
    }

    #[test]
    fn currently_incorrect_reports_the_broken_fix() {
        let log = rev(&[
            "Oct 14 10:01:00 [INCORRECT] 80C",
            "Oct 14 10:02:00 [CORRECT] 98C",
            "Oct 14 10:03:00 [INCORRECT] 80C",
            "Oct 14 10:03:05 [INCORRECT] 80C",
        ]);
        let report = analyze(&log, at(10, 4, 0));
        assert_eq!(
            report,
            HistoryReport::Held {
                since: at(10, 2, 0),
                elapsed: TimeDelta::minutes(2),
                drifted_at: Some(at(10, 3, 0)),
            }
        );
        assert_eq!(
            report.to_string(),
            "drifted at Oct 14 10:03:00; previous fix held for 1m 00s (since Oct 14 10:02:00)"
        );
    }

    #[test]
    fn always_correct_or_empty_is_insufficient() {
        let log = rev(&["Oct 14 10:00:00 [CORRECT] 98C", "Oct 14 10:01:00 [CORRECT] 98C"]);
        assert_eq!(analyze(&log, at(11, 0, 0)), HistoryReport::InsufficientData);
        assert_eq!(
            analyze(Vec::<String>::new(), at(11, 0, 0)),
            HistoryReport::InsufficientData
        );
        let only_incorrect = rev(&["Oct 14 10:00:00 [INCORRECT] 80C"]);
        assert_eq!(
            analyze(&only_incorrect, at(11, 0, 0)),
            HistoryReport::InsufficientData
        );
    }

    #[test]
    fn formats_elapsed_compactly() {
        assert_eq!(format_elapsed(TimeDelta::seconds(4)), "4s");
        assert_eq!(format_elapsed(TimeDelta::seconds(184)), "3m 04s");
        assert_eq!(format_elapsed(TimeDelta::seconds(7384)), "2h 03m 04s");
        assert_eq!(format_elapsed(TimeDelta::seconds(93_784)), "1d 02h 03m 04s");
        assert_eq!(format_elapsed(TimeDelta::seconds(-5)), "0s");
    }
}
