//! Pipeline composition details: counting, field independence, and
//! resilience to junk input.

use std::time::Duration;

use poolwatch::config::Config;
use poolwatch::monitor::Monitor;

use super::common::RecordingNotifier;

fn config(window_size: usize, threshold: f64) -> Config {
    Config {
        window_size,
        error_rate_threshold: threshold,
        alert_cooldown: Duration::from_secs(300),
        ..Config::default()
    }
}

#[tokio::test]
async fn only_lines_with_upstream_status_are_counted() {
    let mut monitor = Monitor::new(&config(10, 2.0), None);

    monitor.process_line("pool=blue release=blue-v1.0.0").await;
    monitor.process_line("garbage with no fields").await;
    assert_eq!(monitor.request_count(), 0);

    monitor.process_line("pool=blue upstream_status=200").await;
    monitor.process_line("upstream_status=404").await;
    assert_eq!(monitor.request_count(), 2);
}

#[tokio::test]
async fn junk_lines_never_stop_the_pipeline() {
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&config(2, 10.0), Some(notifier.clone()));

    monitor.process_line("").await;
    monitor.process_line("upstream_status=notanumber").await;
    monitor.process_line("request_time=... pool=").await;
    monitor.process_line("\"GET / HTTP/1.1\"").await;

    // Pipeline still works afterwards.
    monitor.process_line("pool=blue upstream_status=500").await;
    monitor.process_line("pool=blue upstream_status=500").await;
    assert_eq!(notifier.attempt_count(), 1, "error-rate alert still fires");
}

#[tokio::test]
async fn pool_only_lines_drive_failover_without_feeding_window() {
    let notifier = RecordingNotifier::new();
    // Window of 1 so any single error would alert if it were fed.
    let mut monitor = Monitor::new(&config(1, 0.5), Some(notifier.clone()));

    monitor.process_line("pool=blue").await;
    monitor.process_line("pool=green").await;

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Failover detected"));
    assert_eq!(monitor.request_count(), 0);
}

#[tokio::test]
async fn client_status_does_not_feed_the_error_window() {
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&config(1, 0.5), Some(notifier.clone()));

    // Client saw a 502 but no upstream_status token is present; the
    // window must stay empty and no error-rate alert can fire.
    monitor
        .process_line("10.0.0.1 - \"GET / HTTP/1.1\" 502 pool=blue")
        .await;
    monitor
        .process_line("10.0.0.1 - \"GET / HTTP/1.1\" 502 pool=blue")
        .await;

    assert_eq!(notifier.attempt_count(), 0);
    assert_eq!(monitor.request_count(), 0);
}

#[tokio::test]
async fn window_eviction_recovers_after_error_burst() {
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&config(4, 50.0), Some(notifier.clone()));

    // Saturate with errors: one alert (then cooldown).
    for _ in 0..4 {
        monitor.process_line("upstream_status=500").await;
    }
    assert_eq!(notifier.attempt_count(), 1);

    // Healthy traffic pushes the errors out of the window; even after
    // the cooldown this would no longer qualify.
    for _ in 0..4 {
        monitor.process_line("upstream_status=200").await;
    }
    assert_eq!(notifier.attempt_count(), 1);
    assert_eq!(monitor.request_count(), 8);
}
