//! Failover detection.
//!
//! Tracks which backend pool is actively serving traffic and reports when
//! it changes. The very first pool label observed establishes a baseline
//! and is deliberately not a failover: the monitor may start mid-stream
//! and has no idea what came before.

use chrono::{DateTime, Utc};
use tracing::info;

/// Pool tracking state: no baseline yet, or a known serving pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolState {
    /// No pool label observed yet.
    Unestablished,
    /// The most recently observed serving pool.
    Established(String),
}

/// An observed change of serving pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failover {
    /// Pool that was serving before the change.
    pub from: String,
    /// Pool serving now.
    pub to: String,
    /// When the change was observed.
    pub at: DateTime<Utc>,
}

/// Stateful failover detector over a stream of pool labels.
#[derive(Debug)]
pub struct FailoverDetector {
    state: PoolState,
}

impl FailoverDetector {
    /// Create a detector with no baseline.
    pub fn new() -> Self {
        Self {
            state: PoolState::Unestablished,
        }
    }

    /// Current state, for summary reporting.
    pub fn state(&self) -> &PoolState {
        &self.state
    }

    /// The currently established pool label, if any.
    pub fn current_pool(&self) -> Option<&str> {
        match &self.state {
            PoolState::Unestablished => None,
            PoolState::Established(pool) => Some(pool.as_str()),
        }
    }

    /// Feed one observed pool label.
    ///
    /// Returns `Some(Failover)` only on an actual pool change. The first
    /// label ever observed sets the baseline and returns `None`; a label
    /// equal to the current pool returns `None`.
    pub fn observe(&mut self, pool: &str, at: DateTime<Utc>) -> Option<Failover> {
        match &self.state {
            PoolState::Unestablished => {
                info!(pool, "baseline established");
                self.state = PoolState::Established(pool.to_owned());
                None
            }
            PoolState::Established(current) if current == pool => None,
            PoolState::Established(current) => {
                let failover = Failover {
                    from: current.clone(),
                    to: pool.to_owned(),
                    at,
                };
                self.state = PoolState::Established(pool.to_owned());
                Some(failover)
            }
        }
    }
}

impl Default for FailoverDetector {
    fn default() -> Self {
        Self::new()
    }
}
