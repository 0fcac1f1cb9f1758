//! Age-based cleanup of the storage directory.
//!
//! Segments are never deleted by the request that produced them; they stay
//! fetchable until a sweep finds them older than the retention window.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use ms_core::config::Config;

/// Deletes direct entries of one directory once they outlive `max_age`.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    dir: PathBuf,
    max_age: Duration,
}

impl RetentionSweeper {
    pub fn new(dir: PathBuf, max_age: Duration) -> Self {
        Self { dir, max_age }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.storage.dir(), config.retention.max_age())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Sweep as of the current wall-clock time.
    pub fn sweep_now(&self) -> usize {
        self.sweep(SystemTime::now())
    }

    /// Delete every entry whose age at `now` is strictly greater than the
    /// retention window, returning how many were removed.
    ///
    /// Blocking; call from `spawn_blocking` inside async code. Entries that
    /// cannot be inspected or removed are logged and skipped. A missing
    /// directory is not an error.
    pub fn sweep(&self, now: SystemTime) -> usize {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "Storage directory {} does not exist; nothing to sweep",
                    self.dir.display()
                );
                return 0;
            }
            Err(e) => {
                tracing::warn!("Failed to read storage directory {}: {e}", self.dir.display());
                return 0;
            }
        };

        let mut swept = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {e}");
                    continue;
                }
            };
            let path = entry.path();

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to stat entry: {e}");
                    continue;
                }
            };
            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "No modification time: {e}");
                    continue;
                }
            };

            // mtime in the future counts as age zero.
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age <= self.max_age {
                continue;
            }

            let removed = if metadata.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match removed {
                Ok(()) => {
                    tracing::debug!(
                        path = %path.display(),
                        age_secs = age.as_secs(),
                        "Swept expired entry"
                    );
                    swept += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to delete expired entry: {e}");
                }
            }
        }

        tracing::info!(swept, dir = %self.dir.display(), "Retention sweep finished");
        swept
    }
}
