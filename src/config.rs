//! Configuration loading and validation.
//!
//! All settings come from environment variables (a `.env` file is honored
//! at startup). Precedence: env vars > defaults. Invalid numeric values
//! are warned about and the default is kept, so a typo in one variable
//! never prevents the monitor from starting.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

/// Default access log path (the proxy container mounts its logs here).
const DEFAULT_LOG_FILE: &str = "/logs/access.log";

/// Default 5xx error-rate alert threshold, in percent.
const DEFAULT_ERROR_RATE_THRESHOLD: f64 = 2.0;

/// Default sliding-window capacity, in requests.
const DEFAULT_WINDOW_SIZE: usize = 200;

/// Default minimum spacing between successful alerts of one category.
const DEFAULT_ALERT_COOLDOWN_SECS: u64 = 300;

/// Runtime configuration for the watcher.
#[derive(Debug, Clone)]
pub struct Config {
    /// Webhook endpoint for alerts. `None` suppresses all sends.
    pub webhook_url: Option<String>,

    /// 5xx error-rate alert threshold, in percent (strict `>` comparison).
    pub error_rate_threshold: f64,

    /// Sliding-window capacity in requests. Always at least 1.
    pub window_size: usize,

    /// Minimum spacing between successful alerts of the same category.
    pub alert_cooldown: Duration,

    /// When set, every alert is suppressed before reaching the transport.
    pub maintenance_mode: bool,

    /// Path to the access log to tail.
    pub log_file: PathBuf,

    /// Optional directory for rotated JSON log files. `None` logs to
    /// stderr only.
    pub logs_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: None,
            error_rate_threshold: DEFAULT_ERROR_RATE_THRESHOLD,
            window_size: DEFAULT_WINDOW_SIZE,
            alert_cooldown: Duration::from_secs(DEFAULT_ALERT_COOLDOWN_SECS),
            maintenance_mode: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            logs_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails (see [`Config::validate`]).
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using a custom env resolver (for testing —
    /// avoids mutating the process environment).
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env("POOLWATCH_WEBHOOK_URL") {
            if !v.trim().is_empty() {
                config.webhook_url = Some(v);
            }
        }

        if let Some(v) = env("POOLWATCH_ERROR_RATE_THRESHOLD") {
            match v.parse() {
                Ok(n) => config.error_rate_threshold = n,
                Err(_) => warn_invalid("POOLWATCH_ERROR_RATE_THRESHOLD", &v),
            }
        }

        if let Some(v) = env("POOLWATCH_WINDOW_SIZE") {
            match v.parse() {
                Ok(n) => config.window_size = n,
                Err(_) => warn_invalid("POOLWATCH_WINDOW_SIZE", &v),
            }
        }

        if let Some(v) = env("POOLWATCH_ALERT_COOLDOWN_SECS") {
            match v.parse() {
                Ok(n) => config.alert_cooldown = Duration::from_secs(n),
                Err(_) => warn_invalid("POOLWATCH_ALERT_COOLDOWN_SECS", &v),
            }
        }

        if let Some(v) = env("POOLWATCH_MAINTENANCE_MODE") {
            config.maintenance_mode = v.trim().eq_ignore_ascii_case("true");
        }

        if let Some(v) = env("POOLWATCH_LOG_FILE") {
            config.log_file = PathBuf::from(v);
        }

        if let Some(v) = env("POOLWATCH_LOGS_DIR") {
            config.logs_dir = Some(PathBuf::from(v));
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate invariants the rest of the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns an error if the window size is zero or the threshold is
    /// negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            anyhow::bail!("POOLWATCH_WINDOW_SIZE must be at least 1");
        }
        if !self.error_rate_threshold.is_finite() || self.error_rate_threshold < 0.0 {
            anyhow::bail!(
                "POOLWATCH_ERROR_RATE_THRESHOLD must be a non-negative percentage, got {}",
                self.error_rate_threshold
            );
        }
        Ok(())
    }
}

fn warn_invalid(var: &str, value: &str) {
    tracing::warn!(var, value = %value, "ignoring invalid env override");
}
