#![cfg(unix)]

use std::time::{Duration, Instant};

use rstest::rstest;
use tempguard_hardware::UndervoltTool;
use tempguard_hardware::error::HwError;
use tempguard_traits::{AuxOffsets, TargetReader, TargetWriter, TuningRequest};

fn sh(script: &str) -> UndervoltTool {
    UndervoltTool::new("sh", vec!["-c".to_string(), script.to_string()])
}

fn downcast(e: Box<dyn std::error::Error + Send + Sync>) -> HwError {
    *e.downcast::<HwError>().expect("HwError")
}

#[test]
fn read_returns_stdout() {
    let mut tool = sh("echo 'temperature target: -2 (98C)'");
    let out = tool.read_report(Duration::from_secs(5)).expect("read");
    assert_eq!(out.trim(), "temperature target: -2 (98C)");
}

#[test]
fn read_times_out_and_kills_child() {
    let mut tool = sh("sleep 5");
    let err = tool
        .read_report(Duration::from_millis(50))
        .expect_err("expected timeout");
    match downcast(err) {
        HwError::Timeout { after_ms, .. } => assert_eq!(after_ms, 50),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn background_descendant_holding_stdout_does_not_stretch_the_call() {
    let mut tool = sh("sleep 5 & echo 'temperature target: -2 (98C)'");
    let started = Instant::now();
    let out = tool.read_report(Duration::from_millis(500)).expect("read");
    let took = started.elapsed();
    assert!(took < Duration::from_secs(2), "took {took:?}");
    assert!(out.contains("(98C)"));
}

#[rstest]
#[case("echo boom >&2; exit 3", Some(3), "boom")]
#[case("exit 1", Some(1), "")]
fn nonzero_exit_is_reported(
    #[case] script: &str,
    #[case] code: Option<i32>,
    #[case] stderr_needle: &str,
) {
    let mut tool = sh(script);
    let err = tool.read_report(Duration::from_secs(5)).expect_err("failure");
    match downcast(err) {
        HwError::Exit {
            code: c, stderr, ..
        } => {
            assert_eq!(c, code);
            assert!(stderr.contains(stderr_needle));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn permission_message_maps_to_permission_denied() {
    let mut tool = sh("echo 'open /dev/cpu/0/msr: Permission denied' >&2; exit 1");
    let err = tool.read_report(Duration::from_secs(5)).expect_err("denied");
    assert!(matches!(downcast(err), HwError::PermissionDenied { .. }));
}

#[test]
fn missing_program_is_not_found() {
    let mut tool = UndervoltTool::new("/nonexistent/undervolt", vec![]);
    let err = tool.read_report(Duration::from_secs(1)).expect_err("missing");
    assert!(matches!(downcast(err), HwError::NotFound { .. }));
}

#[rstest]
#[case("true", true)]
#[case("false", false)]
fn apply_reports_exit_status(#[case] program: &str, #[case] ok: bool) {
    let mut tool = UndervoltTool::new(program, vec![]);
    let req = TuningRequest {
        ac_target: 98,
        battery_target: 93,
        offsets: AuxOffsets::default(),
    };
    assert_eq!(tool.apply(&req, Duration::from_secs(5)).is_ok(), ok);
}
