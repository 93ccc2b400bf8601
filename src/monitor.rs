//! Driver loop composing the tailer, parser, detector, estimator, and
//! dispatcher.
//!
//! One logical task pulls lines and runs the pipeline synchronously per
//! line, so all monitor state is mutated from a single place and needs no
//! locking. Per line: parse → feed the error window (and request counter)
//! → run the failover detector → evaluate the error rate → periodic
//! summary. Shutdown is observed between iterations via a watch channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::alert::{AlertCategory, AlertDispatcher, Notifier};
use crate::config::Config;
use crate::detector::{Failover, FailoverDetector};
use crate::parser::LineParser;
use crate::tail::LogTailer;
use crate::window::{ErrorRateSample, ErrorWindow};

/// Emit a summary line every this many counted requests.
const SUMMARY_EVERY: u64 = 50;

/// The stateful event-detection engine.
///
/// Created once at startup; owns every piece of mutable monitoring state
/// (pool baseline, error window, cooldown table, request counter) for the
/// process lifetime.
#[derive(Debug)]
pub struct Monitor {
    parser: LineParser,
    detector: FailoverDetector,
    window: ErrorWindow,
    dispatcher: AlertDispatcher,
    error_rate_threshold: f64,
    /// Monotone count of requests that carried an upstream status.
    request_count: u64,
}

impl Monitor {
    /// Build a monitor from configuration and an optional transport.
    pub fn new(config: &Config, notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self {
            parser: LineParser::new(),
            detector: FailoverDetector::new(),
            window: ErrorWindow::new(config.window_size),
            dispatcher: AlertDispatcher::new(
                notifier,
                config.alert_cooldown,
                config.maintenance_mode,
            ),
            error_rate_threshold: config.error_rate_threshold,
            request_count: 0,
        }
    }

    /// Requests observed so far (those carrying an upstream status).
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Pull lines from the tailer until shutdown is signalled.
    ///
    /// Exits cleanly (Ok) when the watch channel flips to `true` or
    /// closes. A tailer read failure propagates — a visible crash beats a
    /// silent stall for an unattended monitor.
    ///
    /// # Errors
    ///
    /// Returns an error on an unrecoverable read failure.
    pub async fn run(
        &mut self,
        tailer: &mut LogTailer,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        info!("monitoring started");

        loop {
            tokio::select! {
                line = tailer.next_line() => {
                    let line = line?;
                    self.process_line(&line).await;
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("shutdown requested, monitor stopping");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Run the full pipeline for one raw log line.
    ///
    /// Never fails: malformed input degrades to absent fields, and a
    /// delivery failure is the dispatcher's to report.
    pub async fn process_line(&mut self, line: &str) {
        let event = self.parser.parse(line);
        let now = Utc::now();

        // Window first: the estimator sees every upstream status, whether
        // or not the line also carries a pool label.
        let mut sample = None;
        if let Some(status) = event.upstream_status {
            sample = self.window.push(status);
            self.request_count = self.request_count.saturating_add(1);
        }

        if let Some(pool) = event.pool.as_deref() {
            if let Some(failover) = self.detector.observe(pool, now) {
                self.alert_failover(&failover).await;
            }
        }

        if let Some(sample) = sample {
            if sample.rate > self.error_rate_threshold {
                self.alert_error_rate(&sample, now).await;
            }
        }

        if event.upstream_status.is_some() && self.request_count.is_multiple_of(SUMMARY_EVERY) {
            self.log_summary();
        }
    }

    async fn alert_failover(&mut self, failover: &Failover) {
        warn!(from = %failover.from, to = %failover.to, "failover detected");
        let message = format!(
            "Failover detected\n\
             From: {} -> To: {}\n\
             Time: {}\n\
             Reason: primary pool health check failed",
            failover.from,
            failover.to,
            failover.at.format("%Y-%m-%d %H:%M:%S UTC"),
        );
        self.dispatcher
            .dispatch(AlertCategory::Failover, &message, failover.at)
            .await;
    }

    async fn alert_error_rate(&mut self, sample: &ErrorRateSample, now: DateTime<Utc>) {
        warn!(
            rate = sample.rate,
            errors = sample.error_count,
            window = sample.capacity,
            threshold = self.error_rate_threshold,
            "high upstream error rate"
        );
        let message = format!(
            "High error rate alert\n\
             Current rate: {:.1}% (threshold: {}%)\n\
             Errors: {}/{} requests\n\
             Time: {}\n\
             Action: check upstream logs and consider manual intervention",
            sample.rate,
            self.error_rate_threshold,
            sample.error_count,
            sample.capacity,
            now.format("%Y-%m-%d %H:%M:%S UTC"),
        );
        self.dispatcher
            .dispatch(AlertCategory::ErrorRate, &message, now)
            .await;
    }

    /// Non-alerting observability line; detection logic never reads it.
    fn log_summary(&self) {
        info!(
            requests = self.request_count,
            pool = self.detector.current_pool().unwrap_or("unknown"),
            error_rate = %format!("{:.1}%", self.window.current_rate()),
            "stats"
        );
    }
}
