//! Append-only audit log with bounded retention.
//!
//! Line format: `Mon DD HH:MM:SS [TAG] message`. The timestamp carries no
//! year; readers resolve it against the current time (see `parse_line`).
//! `[CORRECT]` and `[INCORRECT]` are the classification markers the history
//! analyzer keys on; every other tag is informational.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::atomic::write_atomic;
use crate::drift::Classification;
use crate::error::StoreError;
use crate::rev_lines::RevLines;

const STAMP_FMT: &str = "%b %e %H:%M:%S";

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Correct,
    Incorrect,
    Applied,
    ApplyFailed,
    History,
    Start,
    Stop,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Correct => "CORRECT",
            Tag::Incorrect => "INCORRECT",
            Tag::Applied => "APPLIED",
            Tag::ApplyFailed => "APPLY-FAILED",
            Tag::History => "HISTORY",
            Tag::Start => "START",
            Tag::Stop => "STOP",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "CORRECT" => Tag::Correct,
            "INCORRECT" => Tag::Incorrect,
            "APPLIED" => Tag::Applied,
            "APPLY-FAILED" => Tag::ApplyFailed,
            "HISTORY" => Tag::History,
            "START" => Tag::Start,
            "STOP" => Tag::Stop,
            _ => return None,
        })
    }

    /// The classification this tag marks, if it is a marker at all.
    pub fn marker(self) -> Option<Classification> {
        match self {
            Tag::Correct => Some(Classification::Correct),
            Tag::Incorrect => Some(Classification::Incorrect),
            _ => None,
        }
    }
}

impl From<Classification> for Tag {
    fn from(c: Classification) -> Self {
        match c {
            Classification::Correct => Tag::Correct,
            Classification::Incorrect => Tag::Incorrect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub tag: Tag,
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: NaiveDateTime, tag: Tag, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            tag,
            message: message.into(),
        }
    }

    /// Render as one log line, without the trailing newline.
    pub fn to_line(&self) -> String {
        // Messages never span lines; a stray newline would forge a fresh entry.
        let msg = self.message.replace(['\n', '\r'], " ");
        format!(
            "{} [{}] {}",
            self.timestamp.format(STAMP_FMT),
            self.tag.as_str(),
            msg
        )
    }
}

/// A line read back from the store. `tag` is `None` for unknown or untagged text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub timestamp: NaiveDateTime,
    pub tag: Option<Tag>,
    pub message: &'a str,
}

/// Pin a year-less timestamp to the latest year that does not put it in the future.
///
/// One day of slack absorbs clock adjustments; Feb 29 falls back to a leap year
/// only if that is the previous one.
pub fn resolve_year(month: u32, day: u32, time: NaiveTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let year = now.year();
    match NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(time)) {
        Some(t) if t <= now + TimeDelta::days(1) => Some(t),
        _ => NaiveDate::from_ymd_opt(year - 1, month, day).map(|d| d.and_time(time)),
    }
}

/// Parse a log line, accepting zero- or space-padded days.
pub fn parse_line(line: &str, now: NaiveDateTime) -> Option<ParsedLine<'_>> {
    let (mon, rest) = line.trim_start().split_once(' ')?;
    let (day, rest) = rest.trim_start().split_once(' ')?;
    let (time, rest) = rest.split_once(' ').unwrap_or((rest, ""));

    let month = MONTHS.iter().position(|m| *m == mon)? as u32 + 1;
    let day: u32 = day.parse().ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
    let timestamp = resolve_year(month, day, time, now)?;

    let rest = rest.trim_start();
    let (tag, message) = match rest
        .strip_prefix('[')
        .and_then(|r| r.split_once(']'))
    {
        Some((t, m)) => match Tag::parse(t) {
            Some(tag) => (Some(tag), m.trim_start()),
            None => (None, rest),
        },
        None => (None, rest),
    };
    Some(ParsedLine {
        timestamp,
        tag,
        message,
    })
}

/// The audit log: append-only file trimmed from the front past `max_lines`.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
    max_lines: usize,
}

impl LogStore {
    pub fn new(path: impl AsRef<Path>, max_lines: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_lines,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Append one entry with a single write so readers never see half a line.
    pub fn append(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let mut line = entry.to_line();
        line.push('\n');
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        f.write_all(line.as_bytes()).map_err(|e| self.io_err(e))
    }

    /// All lines, oldest first. A missing file reads as empty; invalid UTF-8
    /// is replaced rather than rejected.
    pub fn read_lines(&self) -> Result<Vec<String>, StoreError> {
        let bytes = self.read_bytes()?;
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }

    fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(b) => Ok(b),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.io_err(e)),
        }
    }

    /// Lines newest first. A missing file reads as empty.
    pub fn rev_lines(&self) -> Result<RevLines<File>, StoreError> {
        match File::open(&self.path) {
            Ok(f) => RevLines::new(f).map_err(|e| self.io_err(e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RevLines::empty()),
            Err(e) => Err(self.io_err(e)),
        }
    }

    /// Drop the oldest lines so at most `max_lines` remain.
    /// Returns how many lines were removed. Kept lines are copied byte for byte.
    pub fn trim(&self) -> Result<usize, StoreError> {
        let bytes = self.read_bytes()?;
        let starts: Vec<usize> = std::iter::once(0)
            .chain(
                bytes
                    .iter()
                    .enumerate()
                    .filter(|&(i, &b)| b == b'\n' && i + 1 < bytes.len())
                    .map(|(i, _)| i + 1),
            )
            .collect();
        let total = if bytes.is_empty() { 0 } else { starts.len() };
        if total <= self.max_lines {
            return Ok(0);
        }
        let drop = total - self.max_lines;
        let mut kept = bytes[starts[drop]..].to_vec();
        if kept.last() != Some(&b'\n') {
            kept.push(b'\n');
        }
        write_atomic(&self.path, &kept).map_err(|e| self.io_err(e))?;
        tracing::debug!(removed = drop, kept = self.max_lines, "audit log trimmed");
        Ok(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, mo, d)
            .and_then(|d| d.and_hms_opt(h, mi, s))
            .unwrap()
    }

    #[test]
    fn renders_space_padded_stamp() {
        let e = LogEntry::new(at(10, 5, 7, 3, 9), Tag::Correct, "target 98C");
        assert_eq!(e.to_line(), "Oct  5 07:03:09 [CORRECT] target 98C");
    }

    #[test]
    fn newlines_in_messages_are_flattened() {
        let e = LogEntry::new(at(10, 5, 7, 3, 9), Tag::Incorrect, "a\nOct  5 07:03:09 [CORRECT] b");
        assert_eq!(e.to_line().lines().count(), 1);
    }

    #[test]
    fn parses_both_day_paddings() {
        let now = at(10, 14, 12, 0, 0);
        for line in ["Oct  5 07:03:09 [CORRECT] ok", "Oct 05 07:03:09 [CORRECT] ok"] {
            let p = parse_line(line, now).expect("parse");
            assert_eq!(p.timestamp, at(10, 5, 7, 3, 9));
            assert_eq!(p.tag, Some(Tag::Correct));
            assert_eq!(p.message, "ok");
        }
    }

    #[test]
    fn unknown_tags_and_free_text_are_informational() {
        let now = at(10, 14, 12, 0, 0);
        let p = parse_line("Oct 14 11:00:00 [MAYBE] hmm", now).unwrap();
        assert_eq!(p.tag, None);
        assert_eq!(p.message, "[MAYBE] hmm");
        let p = parse_line("Oct 14 11:00:00 restarted by operator", now).unwrap();
        assert_eq!(p.tag, None);
        assert!(parse_line("garbage", now).is_none());
        assert!(parse_line("Foo 14 11:00:00 [CORRECT]", now).is_none());
    }

    #[test]
    fn future_dates_roll_back_a_year() {
        let now = at(1, 2, 0, 0, 0);
        let p = parse_line("Dec 31 23:00:00 [CORRECT] x", now).unwrap();
        assert_eq!(p.timestamp.year(), 2025);
        // within a day ahead stays in the current year
        let now = at(3, 4, 23, 0, 0);
        let p = parse_line("Mar  5 01:00:00 [CORRECT] x", now).unwrap();
        assert_eq!(p.timestamp.year(), 2026);

        // Feb 29 that cannot exist this year falls back to the previous leap year
        let ymd = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .unwrap()
        };
        let p = parse_line("Feb 29 08:00:00 [CORRECT] x", ymd(2025, 1, 10)).unwrap();
        assert_eq!(p.timestamp.date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let p = parse_line("Feb 29 08:00:00 [CORRECT] x", ymd(2024, 3, 1)).unwrap();
        assert_eq!(p.timestamp.year(), 2024);
        // neither this year nor last is a leap year
        assert!(parse_line("Feb 29 08:00:00 [CORRECT] x", ymd(2026, 3, 1)).is_none());
    }
}
