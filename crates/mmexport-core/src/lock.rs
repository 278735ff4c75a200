//! Run-level lock file for the exports directory.
//!
//! Two runs writing into the same exports directory share the progress file
//! and may collide on working directories. When enabled, the lock makes the
//! second run fail fast instead.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::fs::{read_error, write_error};

/// File name of the lock inside the exports directory.
pub const LOCK_FILE_NAME: &str = ".export.lock";

/// Identifier of one export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generate a new random run id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockContents {
    run_id: String,
    pid: u32,
}

/// Held lock; the file is removed on drop.
#[derive(Debug)]
pub struct ExportLock {
    path: PathBuf,
    run_id: RunId,
}

impl ExportLock {
    /// Create the lock file in `exports_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RunInProgress`] if another run holds the lock, or a
    /// filesystem error if the file cannot be created.
    pub fn acquire(exports_dir: &Path, run_id: RunId) -> Result<Self> {
        let path = exports_dir.join(LOCK_FILE_NAME);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = read_holder(&path).unwrap_or_else(|| "unknown".to_string());
                warn!("Export lock {} is held by run {}", path.display(), holder);
                return Err(Error::RunInProgress {
                    run_id: holder,
                    path,
                });
            }
            Err(e) => return Err(write_error(&path, e)),
        };

        let contents = LockContents {
            run_id: run_id.to_string(),
            pid: std::process::id(),
        };
        let json = serde_json::to_string(&contents)?;
        file.write_all(json.as_bytes())
            .map_err(|e| write_error(&path, e))?;

        info!("Acquired export lock for run {}", run_id);
        Ok(Self { path, run_id })
    }

    /// Run id recorded in the lock.
    #[must_use]
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run id recorded in an existing lock file, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file exists but cannot be read.
    pub fn holder(exports_dir: &Path) -> Result<Option<String>> {
        let path = exports_dir.join(LOCK_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| read_error(&path, e))?;
        Ok(serde_json::from_str::<LockContents>(&content)
            .ok()
            .map(|c| c.run_id))
    }
}

impl Drop for ExportLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Released export lock for run {}", self.run_id),
            Err(e) => warn!("Failed to release export lock {}: {}", self.path.display(), e),
        }
    }
}

fn read_holder(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str::<LockContents>(&content)
        .ok()
        .map(|c| c.run_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails() {
        let temp = TempDir::new().expect("temp dir");
        let first = RunId::new();
        let _lock = ExportLock::acquire(temp.path(), first).expect("first acquire");

        let err = ExportLock::acquire(temp.path(), RunId::new()).expect_err("second acquire");
        match err {
            Error::RunInProgress { run_id, path } => {
                assert_eq!(run_id, first.to_string());
                assert_eq!(path, temp.path().join(LOCK_FILE_NAME));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_drop_releases_lock() {
        let temp = TempDir::new().expect("temp dir");
        {
            let lock = ExportLock::acquire(temp.path(), RunId::new()).expect("acquire");
            assert!(lock.path().exists());
        }
        assert!(!temp.path().join(LOCK_FILE_NAME).exists());
        assert!(ExportLock::acquire(temp.path(), RunId::new()).is_ok());
    }

    #[test]
    fn test_holder() {
        let temp = TempDir::new().expect("temp dir");
        assert_eq!(ExportLock::holder(temp.path()).expect("holder"), None);

        let run_id = RunId::new();
        let _lock = ExportLock::acquire(temp.path(), run_id).expect("acquire");
        assert_eq!(
            ExportLock::holder(temp.path()).expect("holder"),
            Some(run_id.to_string())
        );
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
