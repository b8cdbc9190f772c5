use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tempguard_core::{LogEntry, LogStore, Tag, analyze, analyze_store};

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

// One drift near the start, then `n` steady correct/history pairs.
fn synth_lines(n: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(2 * n + 2);
    out.push(LogEntry::new(t0(), Tag::Incorrect, "80C").to_line());
    out.push(LogEntry::new(t0(), Tag::Applied, "ac=98 bat=93").to_line());
    for i in 0..n {
        let at = t0() + TimeDelta::seconds(60 * (i as i64 + 1));
        out.push(LogEntry::new(at, Tag::Correct, "98C").to_line());
        out.push(LogEntry::new(at, Tag::History, "...").to_line());
    }
    out
}

fn bench_history(c: &mut Criterion) {
    let now = t0() + TimeDelta::days(30);

    for n in [100usize, 1_000, 10_000] {
        let lines = synth_lines(n);
        let rev: Vec<&str> = lines.iter().rev().map(String::as_str).collect();
        c.bench_function(&format!("analyze_in_memory_{n}"), |b| {
            b.iter(|| black_box(analyze(black_box(&rev), now)))
        });
    }

    // Recent drift: the backward scan stops after a handful of lines
    // no matter how long the file is.
    let dir = match tempfile::tempdir() {
        Ok(d) => d,
        Err(_) => return,
    };
    let store = LogStore::new(dir.path().join("bench.log"), usize::MAX);
    let mut text = synth_lines(10_000).join("\n");
    text.push('\n');
    text.push_str(&LogEntry::new(now, Tag::Incorrect, "80C").to_line());
    text.push('\n');
    text.push_str(&LogEntry::new(now, Tag::Correct, "98C").to_line());
    text.push('\n');
    if std::fs::write(store.path(), text).is_err() {
        return;
    }
    c.bench_function("analyze_store_recent_drift_10k", |b| {
        b.iter(|| black_box(analyze_store(&store, now).ok()))
    });
}

criterion_group!(benches, bench_history);
criterion_main!(benches);
