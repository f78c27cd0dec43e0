//! Demo workflow scenarios

use std::time::Duration;

use tickflow::demo::{run_demo, DemoOptions};
use tickflow::util::config::TickflowConfig;
use tickflow::RunnerStatus;

fn unpaced() -> TickflowConfig {
    let mut config = TickflowConfig::default();
    config.host.tick_interval_ms = 0;
    config.host.max_ticks = Some(200);
    config
}

#[test]
fn test_demo_completes() {
    let report = run_demo(&unpaced(), &DemoOptions::default());

    assert_eq!(report.status, RunnerStatus::Completed);
    assert!(report.finally_ran);
    assert!(report.error.is_none());
    assert!(report.host.finished);
    assert_eq!(
        report.outputs,
        vec![
            "download started",
            "download finished",
            "progress 1/3",
            "checksum 1",
            "progress 2/3",
            "checksum 2",
            "progress 3/3",
            "checksum 3",
        ]
    );
    // fetch, process, publish and the notification it queued
    assert_eq!(report.stats.tasks_completed, 4);
}

#[test]
fn test_demo_failure_reports_exception() {
    let options = DemoOptions {
        fail: true,
        ..DemoOptions::default()
    };
    let report = run_demo(&unpaced(), &options);

    assert_eq!(report.status, RunnerStatus::Errored);
    assert_eq!(
        report.error.as_deref(),
        Some("task failed: publish rejected by remote")
    );
    assert!(report.finally_ran);
}

#[test]
fn test_demo_cancel_is_silent() {
    let options = DemoOptions {
        cancel_at: Some(1),
        ..DemoOptions::default()
    };
    let report = run_demo(&unpaced(), &options);

    assert_eq!(report.status, RunnerStatus::Cancelled);
    assert_eq!(report.outputs, vec!["download started"]);
    assert!(report.error.is_none());
    assert!(report.finally_ran);
}

#[test]
fn test_demo_times_out_waiting_for_download() {
    let mut config = unpaced();
    config.host.tick_interval_ms = 5;
    let options = DemoOptions {
        download_ticks: u64::MAX,
        timeout: Some(Duration::from_millis(20)),
        ..DemoOptions::default()
    };
    let report = run_demo(&config, &options);

    assert_eq!(report.status, RunnerStatus::TimedOut);
    assert_eq!(report.error.as_deref(), Some("timed out after 20ms"));
    assert!(report.finally_ran);
}
