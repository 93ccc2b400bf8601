//! Log file tailing.
//!
//! Produces an unbounded, ordered sequence of trimmed lines from a
//! live-growing file. Two distinct wait conditions, each cooperative
//! polling rather than OS-level notification:
//!
//! - file does not exist yet → poll every [`DEFAULT_FILE_POLL`] (startup
//!   ordering: the proxy may not have created the log yet);
//! - file open but no complete new line → poll every
//!   [`DEFAULT_READ_POLL`], accepting that much detection latency.
//!
//! Existing content is skipped on open so monitoring starts at "now".
//! The sequence never completes on its own; the caller stops pulling to
//! end monitoring.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tracing::{debug, info};

/// Poll interval while waiting for the log file to appear.
pub const DEFAULT_FILE_POLL: Duration = Duration::from_secs(2);

/// Poll interval while waiting for new bytes in an open file.
pub const DEFAULT_READ_POLL: Duration = Duration::from_millis(100);

/// Tails a single growing log file, yielding one trimmed line at a time.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    reader: BufReader<File>,
    read_poll: Duration,
    /// Partially-read line carried across polls until its newline arrives.
    pending: String,
}

impl LogTailer {
    /// Open `path` for tailing with the default poll intervals.
    ///
    /// Waits (indefinitely) for the file to exist, then seeks to its end
    /// so pre-existing lines are never emitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be opened or seeked.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        Self::open_with_intervals(path, DEFAULT_FILE_POLL, DEFAULT_READ_POLL).await
    }

    /// Open `path` for tailing with explicit poll intervals (used by tests
    /// to keep wait times short).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be opened or seeked.
    pub async fn open_with_intervals(
        path: &Path,
        file_poll: Duration,
        read_poll: Duration,
    ) -> anyhow::Result<Self> {
        if tokio::fs::metadata(path).await.is_err() {
            info!(path = %path.display(), "waiting for log file to appear");
            while tokio::fs::metadata(path).await.is_err() {
                tokio::time::sleep(file_poll).await;
            }
        }

        let mut file = File::open(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to open log file {}: {e}", path.display()))?;

        // Skip history: monitoring begins at "now".
        file.seek(SeekFrom::End(0))
            .await
            .map_err(|e| anyhow::anyhow!("failed to seek log file {}: {e}", path.display()))?;

        info!(path = %path.display(), "log file found, tailing from end");

        Ok(Self {
            path: path.to_owned(),
            reader: BufReader::new(file),
            read_poll,
            pending: String::new(),
        })
    }

    /// Path of the file being tailed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pull the next complete line, suspending until one is available.
    ///
    /// A partial line at end-of-file is held back until its terminating
    /// newline is written. The returned line has trailing whitespace
    /// stripped.
    ///
    /// # Errors
    ///
    /// Returns an error on an underlying read failure. "No new data yet"
    /// is a wait condition, never an error.
    pub async fn next_line(&mut self) -> anyhow::Result<String> {
        loop {
            let read = self
                .reader
                .read_line(&mut self.pending)
                .await
                .map_err(|e| anyhow::anyhow!("read error on {}: {e}", self.path.display()))?;

            if self.pending.ends_with('\n') {
                let line = self.pending.trim_end().to_owned();
                self.pending.clear();
                return Ok(line);
            }

            if read == 0 {
                debug!("no new log data, sleeping");
            }
            // Either at EOF or mid-line; wait for the writer to catch up.
            tokio::time::sleep(self.read_poll).await;
        }
    }
}
