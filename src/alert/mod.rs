//! Alert dispatch with per-category cooldowns.
//!
//! Detection re-fires on every qualifying event; this module is what
//! keeps that from flooding the webhook. Suppression checks run in a
//! fixed order (maintenance → unconfigured → cooldown) and only a
//! *successful* delivery advances a category's cooldown clock, so a
//! failed send retries naturally on the next qualifying detection.
//!
//! The outbound transport sits behind the [`Notifier`] trait; production
//! uses [`webhook::WebhookNotifier`], tests substitute an in-memory fake.

pub mod webhook;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// The closed set of alert categories, each with its own cooldown clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    /// Traffic moved to a different backend pool.
    Failover,
    /// Rolling upstream 5xx rate crossed the threshold.
    ErrorRate,
}

impl AlertCategory {
    /// Stable label used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failover => "failover",
            Self::ErrorRate => "error_rate",
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a dispatch did not reach the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressReason {
    /// Maintenance mode is active; every alert is muted.
    Maintenance,
    /// No webhook endpoint is configured.
    Unconfigured,
    /// The category sent successfully within the cooldown interval.
    Cooldown {
        /// Time left until the category may send again.
        remaining: Duration,
    },
}

/// Result of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The transport acknowledged delivery; the cooldown clock advanced.
    Sent,
    /// The alert never reached the transport.
    Suppressed(SuppressReason),
    /// The transport was attempted and failed; the cooldown clock did
    /// not advance, so the next qualifying detection retries.
    Failed(String),
}

/// Errors from the notification transport.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP transport failure (connection error, timeout).
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("webhook returned HTTP {status}")]
    Rejected {
        /// Status code the endpoint returned.
        status: u16,
    },
}

/// Outbound notification transport.
///
/// Implementations must be `Send + Sync` so the dispatcher can hold them
/// behind an `Arc`.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one human-readable alert message.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery was not acknowledged (transport
    /// failure, timeout, or non-success response).
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// Cooldown-gated alert dispatcher.
///
/// Owns the per-category table of last successful send times. Single
/// instance for the process lifetime, driven only by the monitor loop.
pub struct AlertDispatcher {
    notifier: Option<Arc<dyn Notifier>>,
    cooldown: Duration,
    maintenance_mode: bool,
    last_sent: HashMap<AlertCategory, DateTime<Utc>>,
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("configured", &self.notifier.is_some())
            .field("cooldown", &self.cooldown)
            .field("maintenance_mode", &self.maintenance_mode)
            .field("last_sent", &self.last_sent)
            .finish()
    }
}

impl AlertDispatcher {
    /// Create a dispatcher.
    ///
    /// `notifier: None` means no endpoint is configured and every send is
    /// suppressed with [`SuppressReason::Unconfigured`].
    pub fn new(
        notifier: Option<Arc<dyn Notifier>>,
        cooldown: Duration,
        maintenance_mode: bool,
    ) -> Self {
        Self {
            notifier,
            cooldown,
            maintenance_mode,
            last_sent: HashMap::new(),
        }
    }

    /// Last successful send time for a category, if it has ever sent.
    pub fn last_sent(&self, category: AlertCategory) -> Option<DateTime<Utc>> {
        self.last_sent.get(&category).copied()
    }

    /// Attempt to deliver an alert.
    ///
    /// Suppression order, first match wins: maintenance mode, missing
    /// transport, active cooldown. Otherwise the message goes to the
    /// transport; only an acknowledged delivery records `now` as the
    /// category's last send time.
    pub async fn dispatch(
        &mut self,
        category: AlertCategory,
        message: &str,
        now: DateTime<Utc>,
    ) -> DispatchOutcome {
        if self.maintenance_mode {
            info!(category = %category, "maintenance mode active, alert suppressed");
            return DispatchOutcome::Suppressed(SuppressReason::Maintenance);
        }

        let Some(notifier) = self.notifier.as_ref() else {
            warn!(category = %category, "no webhook configured, alert not sent");
            return DispatchOutcome::Suppressed(SuppressReason::Unconfigured);
        };

        if let Some(last) = self.last_sent.get(&category) {
            let elapsed = now.signed_duration_since(*last).to_std().unwrap_or_default();
            if elapsed < self.cooldown {
                let remaining = self.cooldown.saturating_sub(elapsed);
                info!(
                    category = %category,
                    remaining_secs = remaining.as_secs(),
                    "alert cooldown active"
                );
                return DispatchOutcome::Suppressed(SuppressReason::Cooldown { remaining });
            }
        }

        match notifier.notify(message).await {
            Ok(()) => {
                self.last_sent.insert(category, now);
                info!(category = %category, "alert sent");
                DispatchOutcome::Sent
            }
            Err(e) => {
                // Cooldown clock deliberately untouched: the next
                // qualifying detection is the retry trigger.
                warn!(category = %category, error = %e, "alert delivery failed");
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}
