use std::time::Duration;

use chrono::{NaiveDate, TimeDelta};
use proptest::prelude::*;
use tempguard_core::{Classification, LogEntry, LogStore, Phase, PollCfg, Tag, classify};

proptest! {
    #[test]
    fn classify_accepts_exactly_the_two_targets(
        desired in 1i32..128,
        delta in -40i32..40,
        obs in -200i32..200,
    ) {
        let got = classify(Some(obs), desired, delta);
        let want = if obs == desired || obs == desired + delta {
            Classification::Correct
        } else {
            Classification::Incorrect
        };
        prop_assert_eq!(got, want);
        prop_assert_eq!(classify(Some(desired), desired, delta), Classification::Correct);
        prop_assert_eq!(classify(Some(desired + delta), desired, delta), Classification::Correct);
    }

    #[test]
    fn phase_follows_the_latest_classification(seq in prop::collection::vec(any::<bool>(), 1..50)) {
        let poll = PollCfg { base: Duration::from_secs(60), fast: Duration::from_secs(5) };
        let mut phase = Phase::Steady;
        for correct in seq {
            let c = if correct { Classification::Correct } else { Classification::Incorrect };
            phase = phase.next(c);
            let (want_phase, want_interval) = if correct {
                (Phase::Steady, poll.base)
            } else {
                (Phase::Settling, poll.fast)
            };
            prop_assert_eq!(phase, want_phase);
            prop_assert_eq!(phase.interval(&poll), want_interval);
        }
    }

    #[test]
    fn trim_keeps_the_newest_lines_in_order(max in 1usize..40, extra in 0usize..40) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("t.log"), max);
        let t0 = NaiveDate::from_ymd_opt(2026, 10, 14).and_then(|d| d.and_hms_opt(0, 0, 0)).unwrap();
        let total = max + extra;
        let mut written = Vec::new();
        for i in 0..total {
            let e = LogEntry::new(t0 + TimeDelta::seconds(i as i64), Tag::History, format!("line {i}"));
            written.push(e.to_line());
            store.append(&e).unwrap();
        }
        let removed = store.trim().unwrap();
        prop_assert_eq!(removed, extra);
        let lines = store.read_lines().unwrap();
        prop_assert_eq!(lines.len(), max);
        prop_assert_eq!(&lines[..], &written[extra..]);
    }
}
