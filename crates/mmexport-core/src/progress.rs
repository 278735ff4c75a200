//! File-backed progress journal for long running exports.
//!
//! A polling client reads the journal file while an export runs in the
//! background. The whole entry list is rewritten on every append, which keeps
//! the file valid JSON at all times. Each entry is also emitted as a
//! `tracing` event and, when a subscriber is attached, sent over an
//! unbounded channel.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::fs::{read_error, write_json};

/// Default file name of the progress journal inside the exports directory.
pub const PROGRESS_FILE_NAME: &str = "export_progress.json";

/// One line of progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Set on the final entry of a successful run.
    pub completed: bool,
    /// Success counter at the time of the entry.
    pub counter: i64,
    /// Whether the entry reports a failure.
    #[serde(rename = "isError")]
    pub is_error: bool,
    /// Human readable message.
    pub message: String,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
}

/// Append-only progress log persisted as a JSON array.
#[derive(Debug)]
pub struct ProgressJournal {
    path: PathBuf,
    entries: Vec<ProgressEntry>,
    counter: i64,
    sender: Option<mpsc::UnboundedSender<ProgressEntry>>,
}

impl ProgressJournal {
    /// Start a fresh journal at `path`, removing any previous one.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.exists() {
            debug!("Removing previous progress file {}", path.display());
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove previous progress file: {}", e);
            }
        }
        Self {
            path,
            entries: Vec::new(),
            counter: 0,
            sender: None,
        }
    }

    /// Attach a channel that receives a copy of every entry.
    #[must_use]
    pub fn with_sender(mut self, sender: mpsc::UnboundedSender<ProgressEntry>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a progress message.
    pub fn log(&mut self, message: impl Into<String>) {
        self.append(message.into(), false, false);
    }

    /// Record a failure.
    pub fn log_error(&mut self, message: impl Into<String>) {
        self.append(message.into(), true, false);
    }

    /// Record that `process` has finished.
    pub fn log_finished(&mut self, process: &str) {
        self.append(format!("{process} has completed!"), false, true);
    }

    /// Bump the success counter.
    pub const fn increase_counter(&mut self) {
        self.counter += 1;
    }

    /// Lower the success counter.
    pub const fn reduce_counter(&mut self) {
        self.counter -= 1;
    }

    /// Reset the success counter to zero.
    pub const fn reset_counter(&mut self) {
        self.counter = 0;
    }

    /// Current success counter.
    #[must_use]
    pub const fn counter(&self) -> i64 {
        self.counter
    }

    /// Entries recorded so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[ProgressEntry] {
        &self.entries
    }

    fn append(&mut self, message: String, is_error: bool, completed: bool) {
        if is_error {
            error!(counter = self.counter, "{}", message);
        } else {
            info!(counter = self.counter, completed, "{}", message);
        }

        let entry = ProgressEntry {
            completed,
            counter: self.counter,
            is_error,
            message,
            timestamp: Local::now().timestamp(),
        };

        if let Some(sender) = &self.sender
            && sender.send(entry.clone()).is_err()
        {
            debug!("Progress receiver dropped, detaching channel");
            self.sender = None;
        }

        self.entries.push(entry);

        // Write failures never abort the export.
        if let Err(e) = write_json(&self.path, &self.entries) {
            warn!("Failed to write progress file: {}", e);
        }
    }
}

/// Read the entries of a journal file for a polling client.
///
/// A missing file yields an empty list.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_progress(path: &Path) -> Result<Vec<ProgressEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|e| read_error(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_removes_previous_file() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join(PROGRESS_FILE_NAME);
        fs::write(&path, "stale").expect("write");

        let journal = ProgressJournal::new(&path);
        assert!(!path.exists());
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn test_every_append_rewrites_file() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join(PROGRESS_FILE_NAME);
        let mut journal = ProgressJournal::new(&path);

        journal.log("Export started!");
        assert_eq!(read_progress(&path).expect("read").len(), 1);

        journal.increase_counter();
        journal.log_error("Something broke");
        let entries = read_progress(&path).expect("read");
        assert_eq!(entries.len(), 2);
        assert!(entries[1].is_error);
        assert_eq!(entries[1].counter, 1);
        assert!(!entries[1].completed);
    }

    #[test]
    fn test_file_uses_client_keys() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join(PROGRESS_FILE_NAME);
        let mut journal = ProgressJournal::new(&path);
        journal.log("hello");

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        let entry = &raw[0];
        for key in ["completed", "counter", "isError", "message", "timestamp"] {
            assert!(entry.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn test_log_finished() {
        let temp = TempDir::new().expect("temp dir");
        let mut journal = ProgressJournal::new(temp.path().join(PROGRESS_FILE_NAME));
        journal.log_finished("Content Exporter");

        let last = journal.entries().last().expect("entry");
        assert_eq!(last.message, "Content Exporter has completed!");
        assert!(last.completed);
        assert!(!last.is_error);
    }

    #[test]
    fn test_counter_operations() {
        let temp = TempDir::new().expect("temp dir");
        let mut journal = ProgressJournal::new(temp.path().join(PROGRESS_FILE_NAME));
        journal.increase_counter();
        journal.increase_counter();
        journal.reduce_counter();
        assert_eq!(journal.counter(), 1);
        journal.reset_counter();
        assert_eq!(journal.counter(), 0);
    }

    #[test]
    fn test_sender_receives_entries() {
        let temp = TempDir::new().expect("temp dir");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut journal =
            ProgressJournal::new(temp.path().join(PROGRESS_FILE_NAME)).with_sender(tx);

        journal.log("one");
        journal.log_error("two");

        assert_eq!(rx.try_recv().expect("first").message, "one");
        assert!(rx.try_recv().expect("second").is_error);
    }

    #[test]
    fn test_dropped_receiver_does_not_break_logging() {
        let temp = TempDir::new().expect("temp dir");
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut journal =
            ProgressJournal::new(temp.path().join(PROGRESS_FILE_NAME)).with_sender(tx);
        journal.log("still written");
        assert_eq!(journal.entries().len(), 1);
    }

    #[test]
    fn test_read_progress_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        let entries = read_progress(&temp.path().join("none.json")).expect("read");
        assert!(entries.is_empty());
    }
}
