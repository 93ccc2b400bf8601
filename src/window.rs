//! Sliding-window error-rate estimation.
//!
//! Keeps the most recent `capacity` upstream status codes in a bounded
//! FIFO and computes the 5xx ratio over them. The estimator is inert
//! until the window has been filled once: a rate over a half-empty window
//! would over-weight early errors right after startup.

use std::collections::VecDeque;

/// HTTP status codes at or above this count as upstream errors.
const ERROR_STATUS_FLOOR: u16 = 500;

/// A computed error-rate observation over a saturated window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorRateSample {
    /// Percentage of 5xx entries in the window (0.0 ..= 100.0).
    pub rate: f64,
    /// Number of 5xx entries in the window.
    pub error_count: usize,
    /// Window capacity the rate was computed over.
    pub capacity: usize,
}

/// Bounded FIFO of the most recent upstream status codes.
#[derive(Debug)]
pub struct ErrorWindow {
    entries: VecDeque<u16>,
    capacity: usize,
    /// Running count of 5xx entries currently in the window, maintained
    /// incrementally so each push is O(1).
    error_count: usize,
}

impl ErrorWindow {
    /// Create a window holding up to `capacity` status codes.
    ///
    /// `capacity` must be at least 1; config validation enforces this
    /// before construction.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            error_count: 0,
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of status codes currently held (≤ capacity).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the window holds no entries yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the window has been filled to capacity.
    pub fn is_saturated(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Number of 5xx entries currently held.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Append one upstream status, evicting the oldest entry when full.
    ///
    /// Returns a rate sample once the window is saturated, `None` while
    /// it is still filling (insufficient data, never alerts).
    pub fn push(&mut self, status: u16) -> Option<ErrorRateSample> {
        if self.entries.len() >= self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                if is_error(evicted) {
                    self.error_count = self.error_count.saturating_sub(1);
                }
            }
        }

        self.entries.push_back(status);
        if is_error(status) {
            self.error_count = self.error_count.saturating_add(1);
        }

        self.is_saturated().then(|| ErrorRateSample {
            rate: percentage(self.error_count, self.capacity),
            error_count: self.error_count,
            capacity: self.capacity,
        })
    }

    /// Error rate over the window's current contents, regardless of
    /// saturation. Used for summary statistics only, never for alerting.
    pub fn current_rate(&self) -> f64 {
        if self.entries.is_empty() {
            0.0
        } else {
            percentage(self.error_count, self.entries.len())
        }
    }
}

fn is_error(status: u16) -> bool {
    status >= ERROR_STATUS_FLOOR
}

/// `100 * part / whole` as a percentage.
fn percentage(part: usize, whole: usize) -> f64 {
    // Counts are bounded by the window capacity; u32 keeps the f64
    // conversion exact.
    let part = u32::try_from(part).unwrap_or(u32::MAX);
    let whole = u32::try_from(whole).unwrap_or(u32::MAX).max(1);
    100.0 * f64::from(part) / f64::from(whole)
}
