//! Webhook notification transport.
//!
//! Posts `{"text": "<message>"}` to the configured endpoint (the shape
//! Slack-compatible incoming webhooks expect). Any 2xx acknowledgement
//! counts as delivered; anything else, including a timeout, is a
//! [`NotifyError`] for the dispatcher to handle.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{Notifier, NotifyError};

/// Hard upper bound on how long one delivery may stall the monitor loop.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON body for the webhook call.
#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    text: &'a str,
}

/// [`Notifier`] backed by an HTTP webhook endpoint.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URL can embed a secret token; keep it out of debug output.
        f.debug_struct("WebhookNotifier").finish_non_exhaustive()
    }
}

impl WebhookNotifier {
    /// Create a notifier for the given endpoint URL.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(NOTIFY_TIMEOUT)
            .json(&AlertPayload { text })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
