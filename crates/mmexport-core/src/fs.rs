//! Filesystem helpers used by the exporter.
//!
//! Thin wrappers over `std::fs` that attach the offending path to every
//! failure, so errors reported through the progress journal say where they
//! happened.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, FileSystemError, Result};

/// Converts an I/O error for read operations.
pub(crate) fn read_error(path: &Path, e: io::Error) -> Error {
    Error::FileSystem(FileSystemError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Converts an I/O error for write operations.
pub(crate) fn write_error(path: &Path, e: io::Error) -> Error {
    Error::FileSystem(FileSystemError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Converts an I/O error for directory creation.
pub(crate) fn create_dir_error(path: &Path, e: io::Error) -> Error {
    Error::FileSystem(FileSystemError::CreateDirFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Converts an I/O error for delete operations.
pub(crate) fn delete_error(path: &Path, e: io::Error) -> Error {
    Error::FileSystem(FileSystemError::DeleteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Converts an I/O error for copy operations.
fn copy_error(src: &Path, dst: &Path, e: io::Error) -> Error {
    Error::FileSystem(FileSystemError::CopyFailed {
        source_path: src.to_path_buf(),
        destination: dst.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Create a directory (and parents) if it does not exist yet.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| create_dir_error(path, e))
}

/// Serialize `value` as compact JSON and write it to `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string(value)?;
    fs::write(path, content).map_err(|e| write_error(path, e))
}

/// Copy `src` into `dir`, keeping the file name given by `file_name`.
///
/// Returns the destination path.
pub fn copy_into(src: &Path, dir: &Path, file_name: &str) -> Result<PathBuf> {
    let dst = dir.join(file_name);
    fs::copy(src, &dst).map_err(|e| copy_error(src, &dst, e))?;
    Ok(dst)
}

/// Rename a file.
pub fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| {
        Error::FileSystem(FileSystemError::RenameFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            reason: e.to_string(),
        })
    })
}

/// Remove a single file.
pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| delete_error(path, e))
}

/// Recursively remove a directory. A missing directory is not an error.
pub fn remove_tree(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    fs::remove_dir_all(path).map_err(|e| delete_error(path, e))
}

/// Last path component as an owned string, if it is valid UTF-8.
pub fn file_name_of(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_creates_nested() {
        let temp = TempDir::new().expect("temp dir");
        let nested = temp.path().join("a").join("b");
        ensure_dir(&nested).expect("should create");
        assert!(nested.is_dir());
        // Second call is a no-op
        ensure_dir(&nested).expect("should be idempotent");
    }

    #[test]
    fn test_write_json_is_compact() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("out.json");
        write_json(&path, &serde_json::json!({"a": 1})).expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), r#"{"a":1}"#);
    }

    #[test]
    fn test_copy_into_missing_source_reports_paths() {
        let temp = TempDir::new().expect("temp dir");
        let err = copy_into(&temp.path().join("nope.png"), temp.path(), "nope.png")
            .expect_err("should fail");
        assert!(matches!(
            err,
            Error::FileSystem(FileSystemError::CopyFailed { .. })
        ));
    }

    #[test]
    fn test_remove_tree_missing_is_ok() {
        let temp = TempDir::new().expect("temp dir");
        assert!(remove_tree(&temp.path().join("missing")).is_ok());
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(
            file_name_of(Path::new("/x/y/cover.jpg")),
            Some("cover.jpg".to_string())
        );
        assert_eq!(file_name_of(Path::new("/")), None);
    }
}
