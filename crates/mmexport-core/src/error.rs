//! Error types for mmexport core operations.
//!
//! Errors are grouped by domain: filesystem failures carry the path they
//! happened on, content errors are raised while building the content model,
//! and archive errors come from the zip writer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mmexport core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed.
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    /// Content model could not be built.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Archive could not be written.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The requested package does not exist in the content source.
    #[error("Package not found: {slug}")]
    PackageNotFound {
        /// Slug that was requested.
        slug: String,
    },

    /// No packages were available to export.
    #[error("No packages found!")]
    NoPackages,

    /// Another export run holds the run lock.
    #[error("Another export is already running (run {run_id}, lock {path})")]
    RunInProgress {
        /// Identifier recorded by the run holding the lock.
        run_id: String,
        /// Path of the lock file.
        path: PathBuf,
    },

    /// The export run was cancelled.
    #[error("Export cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Filesystem failures, tagged with the path involved.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// Path does not exist.
    #[error("Path not found: {path}")]
    NotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// Directory could not be created.
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirFailed {
        /// Directory path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// File could not be read.
    #[error("Failed to read {path}: {reason}")]
    ReadFailed {
        /// File path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// File could not be written.
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// File path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// File could not be copied.
    #[error("Failed to copy {source_path} to {destination}: {reason}")]
    CopyFailed {
        /// Source path.
        source_path: PathBuf,
        /// Destination path.
        destination: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// File could not be renamed.
    #[error("Failed to rename {from} to {to}: {reason}")]
    RenameFailed {
        /// Original path.
        from: PathBuf,
        /// New path.
        to: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// File or directory could not be deleted.
    #[error("Failed to delete {path}: {reason}")]
    DeleteFailed {
        /// Path being deleted.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// Path is not usable for the requested operation.
    #[error("Invalid path {path}: {reason}")]
    InvalidPath {
        /// Offending path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },
}

/// Which asset of a content item is meant in a [`ContentError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Cover or thumbnail image.
    Image,
    /// Audio or video file.
    Media,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Media => write!(f, "media"),
        }
    }
}

/// Errors raised while building content model objects.
#[derive(Debug, Error)]
pub enum ContentError {
    /// A local asset file does not exist.
    #[error("The {kind} file does not exist: {path}")]
    MissingAsset {
        /// Image or media.
        kind: AssetKind,
        /// Path that was checked.
        path: PathBuf,
    },

    /// A local asset path has no file name component.
    #[error("The {kind} path has no file name: {path}")]
    UnnamedAsset {
        /// Image or media.
        kind: AssetKind,
        /// Offending path.
        path: PathBuf,
    },

    /// The content catalog is malformed.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// Errors raised by the archive writer.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The directory to archive does not exist.
    #[error("Archive source is not a directory: {path}")]
    SourceNotDirectory {
        /// Source directory.
        path: PathBuf,
    },

    /// The zip writer failed.
    #[error("Failed to write archive {path}: {reason}")]
    WriteFailed {
        /// Archive path.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        Self::FileSystem(FileSystemError::ReadFailed {
            path,
            reason: err.to_string(),
        })
    }
}
