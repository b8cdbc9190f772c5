#![no_main]
use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Some(now) = NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(12, 0, 0)) else {
        return;
    };
    // Audit-log lines and tool reports both come from outside the process.
    for line in data.lines() {
        let _ = tempguard_core::log_store::parse_line(line, now);
    }
    let _ = tempguard_core::parse_temp_target(data);
});
