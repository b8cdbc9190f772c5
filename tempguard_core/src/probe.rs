//! Settings probe: read the tool report and pull out the temperature target.

use std::time::Duration;

use tempguard_traits::TargetReader;

use crate::error::ProbeError;
use crate::hw_error::map_probe_error;

const FIELD: &str = "temperature target";

fn snippet(report: &str) -> String {
    let s: String = report.trim().chars().take(80).collect();
    if s.is_empty() { "<empty>".to_string() } else { s }
}

/// `(98C)`, `(98 C)` or `(98°C)` anywhere in the line.
fn celsius_group(line: &str) -> Option<i32> {
    let open = line.find('(')?;
    let close = open + line[open..].find(')')?;
    let inner = line[open + 1..close].trim();
    let digits = inner.strip_suffix(['C', 'c'])?;
    digits.trim_end_matches('°').trim().parse().ok()
}

/// Extract the effective temperature target from free-form tool output.
///
/// The first line mentioning `temperature target` wins. A `(<n>C)` group is
/// preferred; otherwise the last integer after the colon is taken.
pub fn parse_temp_target(report: &str) -> Result<i32, ProbeError> {
    let line = report
        .lines()
        .find(|l| l.to_ascii_lowercase().contains(FIELD))
        .ok_or_else(|| ProbeError::Unparsable(snippet(report)))?;

    if let Some(v) = celsius_group(line) {
        return Ok(v);
    }
    let tail = line.split_once(':').map_or(line, |(_, t)| t);
    tail.split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .filter_map(|tok| tok.parse::<i32>().ok())
        .last()
        .ok_or_else(|| ProbeError::Unparsable(snippet(line)))
}

/// Read path of the hardware-control capability.
pub struct SettingsProbe<R> {
    reader: R,
    timeout: Duration,
}

impl<R: TargetReader> SettingsProbe<R> {
    pub fn new(reader: R, timeout: Duration) -> Self {
        Self { reader, timeout }
    }

    /// One observation of the currently effective temperature target.
    pub fn probe(&mut self) -> Result<i32, ProbeError> {
        let report = self
            .reader
            .read_report(self.timeout)
            .map_err(|e| map_probe_error(e.as_ref()))?;
        let value = parse_temp_target(&report)?;
        tracing::debug!(value, "probed temperature target");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("temperature target: -2 (98C)\ncore: -110.35 mV\n", 98)]
    #[case("core: -110.35 mV\nTemperature Target: -7 (93 C)\n", 93)]
    #[case("temperature target: -20 (80°C)", 80)]
    #[case("temperature target: 97", 97)]
    #[case("temperature target: offset -3", -3)]
    fn parses_known_formats(#[case] report: &str, #[case] want: i32) {
        assert_eq!(parse_temp_target(report), Ok(want));
    }

    #[rstest]
    #[case("")]
    #[case("core: -110.35 mV\ngpu: -80 mV\n")]
    #[case("temperature target: unknown")]
    fn rejects_reports_without_a_value(#[case] report: &str) {
        assert!(matches!(
            parse_temp_target(report),
            Err(ProbeError::Unparsable(_))
        ));
    }

    struct Canned(Result<&'static str, &'static str>);
    impl TargetReader for Canned {
        fn read_report(&mut self, _t: Duration) -> Result<String, tempguard_traits::BoxError> {
            self.0
                .map(str::to_string)
                .map_err(|e| Box::new(std::io::Error::other(e)) as tempguard_traits::BoxError)
        }
    }

    #[test]
    fn probe_maps_reader_failures() {
        let mut p = SettingsProbe::new(Canned(Err("timed out")), Duration::from_secs(1));
        assert_eq!(p.probe(), Err(ProbeError::Timeout));
        let mut p = SettingsProbe::new(Canned(Ok("temperature target: -2 (98C)")), Duration::from_secs(1));
        assert_eq!(p.probe(), Ok(98));
    }
}
