//! Alert behavior of the composed pipeline: failovers, error rates,
//! cooldowns, maintenance mode, and transport failure handling.

use std::time::Duration;

use poolwatch::config::Config;
use poolwatch::monitor::Monitor;

use super::common::RecordingNotifier;

fn test_config() -> Config {
    Config {
        window_size: 4,
        error_rate_threshold: 50.0,
        alert_cooldown: Duration::from_secs(300),
        ..Config::default()
    }
}

fn line(pool: &str, upstream_status: u16) -> String {
    format!(
        "10.0.0.1 - \"GET /api HTTP/1.1\" {upstream_status} pool={pool} \
         upstream_status={upstream_status} upstream=172.18.0.2:3000 \
         request_time=0.020 upstream_time=0.015"
    )
}

#[tokio::test]
async fn baseline_pool_produces_no_alert() {
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&test_config(), Some(notifier.clone()));

    monitor.process_line(&line("blue", 200)).await;
    assert_eq!(notifier.attempt_count(), 0);
}

#[tokio::test]
async fn pool_change_sends_failover_alert() {
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&test_config(), Some(notifier.clone()));

    monitor.process_line(&line("blue", 200)).await;
    monitor.process_line(&line("green", 200)).await;

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Failover detected"));
    assert!(messages[0].contains("From: blue -> To: green"));
}

#[tokio::test]
async fn repeated_pool_is_steady_state() {
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&test_config(), Some(notifier.clone()));

    monitor.process_line(&line("blue", 200)).await;
    monitor.process_line(&line("blue", 200)).await;
    monitor.process_line(&line("blue", 200)).await;
    assert_eq!(notifier.attempt_count(), 0);
}

#[tokio::test]
async fn second_failover_within_cooldown_is_suppressed() {
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&test_config(), Some(notifier.clone()));

    monitor.process_line(&line("blue", 200)).await;
    monitor.process_line(&line("green", 200)).await;
    // Flap straight back; detection fires but the dispatcher holds it.
    monitor.process_line(&line("blue", 200)).await;

    assert_eq!(notifier.attempt_count(), 1);
}

#[tokio::test]
async fn saturated_window_above_threshold_alerts() {
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&test_config(), Some(notifier.clone()));

    // Three errors do not saturate the window of four: no alert yet.
    for _ in 0..3 {
        monitor.process_line(&line("blue", 500)).await;
    }
    assert_eq!(notifier.attempt_count(), 0);

    // Fourth entry saturates it at 100% > 50%.
    monitor.process_line(&line("blue", 503)).await;

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("High error rate alert"));
    assert!(messages[0].contains("Errors: 4/4 requests"));
    assert!(messages[0].contains("100.0%"));
}

#[tokio::test]
async fn rate_at_threshold_does_not_alert() {
    // Threshold 50, window 4, two errors → exactly 50%: strict > means no alert.
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&test_config(), Some(notifier.clone()));

    monitor.process_line(&line("blue", 500)).await;
    monitor.process_line(&line("blue", 500)).await;
    monitor.process_line(&line("blue", 200)).await;
    monitor.process_line(&line("blue", 200)).await;
    assert_eq!(notifier.attempt_count(), 0);
}

#[tokio::test]
async fn maintenance_mode_blocks_all_alerts() {
    let config = Config {
        maintenance_mode: true,
        ..test_config()
    };
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&config, Some(notifier.clone()));

    monitor.process_line(&line("blue", 500)).await;
    monitor.process_line(&line("green", 500)).await;
    monitor.process_line(&line("blue", 500)).await;
    monitor.process_line(&line("green", 500)).await;
    monitor.process_line(&line("blue", 500)).await;

    assert_eq!(notifier.attempt_count(), 0);
}

#[tokio::test]
async fn unconfigured_transport_never_panics() {
    let mut monitor = Monitor::new(&test_config(), None);

    monitor.process_line(&line("blue", 500)).await;
    monitor.process_line(&line("green", 500)).await;
    monitor.process_line(&line("blue", 500)).await;
    monitor.process_line(&line("green", 500)).await;
}

#[tokio::test]
async fn failed_delivery_retries_on_next_detection() {
    let notifier = RecordingNotifier::failing();
    let mut monitor = Monitor::new(&test_config(), Some(notifier.clone()));

    monitor.process_line(&line("blue", 200)).await;
    monitor.process_line(&line("green", 200)).await;
    // The failed send must not have started the cooldown clock, so the
    // next failover reaches the transport again.
    monitor.process_line(&line("blue", 200)).await;

    assert_eq!(notifier.attempt_count(), 2);
}

#[tokio::test]
async fn failover_and_error_rate_cooldowns_are_independent() {
    let notifier = RecordingNotifier::new();
    let mut monitor = Monitor::new(&test_config(), Some(notifier.clone()));

    // Saturate the window with errors while also changing pool: both
    // categories fire on their own clocks.
    monitor.process_line(&line("blue", 500)).await;
    monitor.process_line(&line("blue", 500)).await;
    monitor.process_line(&line("blue", 500)).await;
    monitor.process_line(&line("green", 500)).await;

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().any(|m| m.contains("Failover detected")));
    assert!(messages.iter().any(|m| m.contains("High error rate alert")));
}
