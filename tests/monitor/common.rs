//! Shared fixtures for monitor integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use poolwatch::alert::{Notifier, NotifyError};

/// In-memory transport recording every message it is asked to deliver.
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("not poisoned").clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.messages.lock().expect("not poisoned").len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .expect("not poisoned")
            .push(text.to_owned());
        if self.fail {
            Err(NotifyError::Rejected { status: 503 })
        } else {
            Ok(())
        }
    }
}
