//! Local files that travel with exported content.
//!
//! An [`Asset`] can only be built for a file that exists, so every content
//! object holding one is guaranteed packageable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AssetKind, ContentError, Result};
use crate::fs::file_name_of;

/// A local file plus the public references used in exported JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    local_path: PathBuf,
    file_name: String,
    url: String,
    mime_type: String,
}

impl Asset {
    /// Build an asset, checking that `local_path` exists.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::MissingAsset`] when the file does not exist and
    /// [`ContentError::UnnamedAsset`] when the path has no file name.
    pub fn new(kind: AssetKind, local_path: impl Into<PathBuf>, url: impl Into<String>) -> Result<Self> {
        let local_path = local_path.into();
        if !local_path.exists() {
            return Err(ContentError::MissingAsset {
                kind,
                path: local_path,
            }
            .into());
        }
        let Some(file_name) = file_name_of(&local_path) else {
            return Err(ContentError::UnnamedAsset {
                kind,
                path: local_path,
            }
            .into());
        };
        let mime_type = mime_type_for(&local_path).to_string();
        Ok(Self {
            local_path,
            file_name,
            url: url.into(),
            mime_type,
        })
    }

    /// Build an image asset.
    pub fn image(local_path: impl Into<PathBuf>, url: impl Into<String>) -> Result<Self> {
        Self::new(AssetKind::Image, local_path, url)
    }

    /// Build a media asset.
    pub fn media(local_path: impl Into<PathBuf>, url: impl Into<String>) -> Result<Self> {
        Self::new(AssetKind::Media, local_path, url)
    }

    /// Path of the file on the local filesystem.
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// File name used inside full archives.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Remote URL used by slim archives.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// MIME type derived from the file extension.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// Guess a MIME type from a file extension.
///
/// Unknown extensions map to `application/octet-stream`.
pub fn mime_type_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return "application/octet-stream";
    };
    match ext.to_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "epub" => "application/epub+zip",
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
