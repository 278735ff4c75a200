//! Recursive directory-to-zip packing.
//!
//! The tree's own directory name never appears in the archive: every entry
//! is stored under a caller-chosen root folder, so working directories can
//! carry run-specific names while consumers always see the same layout.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use crate::error::{ArchiveError, Error, Result};
use crate::fs::{read_error, write_error};

/// Root folder name every export archive exposes.
pub const ARCHIVE_ROOT: &str = "content";

/// Statistics about a written archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Path of the written archive.
    pub path: PathBuf,
    /// Number of file entries.
    pub files: usize,
    /// Number of directory entries, including the root folder.
    pub directories: usize,
}

/// Pack `source_dir` into a new zip at `zip_path`, rooted at `root_name`.
///
/// An empty `root_name` stores entries at the top level of the archive.
/// A partially written archive is removed when packing fails.
pub fn zip_tree(source_dir: &Path, zip_path: &Path, root_name: &str) -> Result<ArchiveSummary> {
    if !source_dir.is_dir() {
        return Err(ArchiveError::SourceNotDirectory {
            path: source_dir.to_path_buf(),
        }
        .into());
    }

    let result = write_archive(source_dir, zip_path, root_name);
    if result.is_err() && zip_path.exists() {
        warn!("Removing partial archive {}", zip_path.display());
        if let Err(e) = std::fs::remove_file(zip_path) {
            warn!("Failed to remove partial archive: {}", e);
        }
    }
    result
}

fn write_archive(source_dir: &Path, zip_path: &Path, root_name: &str) -> Result<ArchiveSummary> {
    let zip_error = |e: ZipError| -> Error {
        ArchiveError::WriteFailed {
            path: zip_path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    };

    let file = File::create(zip_path).map_err(|e| write_error(zip_path, e))?;
    let mut zip = ZipWriter::new(file);
    let file_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let dir_options = SimpleFileOptions::default().unix_permissions(0o755);

    let mut summary = ArchiveSummary {
        path: zip_path.to_path_buf(),
        files: 0,
        directories: 0,
    };

    if !root_name.is_empty() {
        zip.add_directory(format!("{root_name}/"), dir_options)
            .map_err(zip_error)?;
        summary.directories += 1;
    }

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(source_dir) else {
            continue;
        };
        let name = entry_name(root_name, relative);

        if entry.file_type().is_dir() {
            debug!("Adding directory {}", name);
            zip.add_directory(format!("{name}/"), dir_options)
                .map_err(zip_error)?;
            summary.directories += 1;
        } else if entry.file_type().is_file() {
            debug!("Adding file {}", name);
            zip.start_file(name, file_options).map_err(zip_error)?;
            let mut source = File::open(path).map_err(|e| read_error(path, e))?;
            io::copy(&mut source, &mut zip).map_err(|e| write_error(zip_path, e))?;
            summary.files += 1;
        }
    }

    zip.finish().map_err(zip_error)?;
    Ok(summary)
}

/// Archive entry name for a path relative to the packed directory.
fn entry_name(root_name: &str, relative: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !root_name.is_empty() {
        parts.push(root_name.to_string());
    }
    parts.extend(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn build_tree(root: &Path) {
        fs::create_dir_all(root.join("en").join("data")).expect("mkdir");
        fs::create_dir_all(root.join("en").join("media")).expect("mkdir");
        fs::write(root.join("languages.json"), "[]").expect("write");
        fs::write(root.join("en").join("data").join("main.json"), "{}").expect("write");
        fs::write(root.join("en").join("media").join("a.mp3"), "mp3").expect("write");
    }

    #[test]
    fn test_zip_tree_remaps_root() {
        let temp = TempDir::new().expect("temp dir");
        let tree = temp.path().join("sports_01-01-2021-00-00");
        build_tree(&tree);
        let zip_path = temp.path().join("sports.zip");

        let summary = zip_tree(&tree, &zip_path, ARCHIVE_ROOT).expect("zip");
        assert_eq!(summary.files, 3);
        // content/, en/, en/data/, en/media/
        assert_eq!(summary.directories, 4);

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).expect("open")).expect("zip");
        let names: Vec<String> = archive.file_names().map(ToString::to_string).collect();
        assert!(names.contains(&"content/".to_string()));
        assert!(names.contains(&"content/en/data/main.json".to_string()));
        assert!(names.contains(&"content/en/media/a.mp3".to_string()));
        assert!(names.iter().all(|n| !n.contains("sports_01")));

        let mut content = String::new();
        archive
            .by_name("content/languages.json")
            .expect("entry")
            .read_to_string(&mut content)
            .expect("read");
        assert_eq!(content, "[]");
    }

    #[test]
    fn test_zip_tree_without_root_name() {
        let temp = TempDir::new().expect("temp dir");
        let tree = temp.path().join("tree");
        build_tree(&tree);
        let zip_path = temp.path().join("flat.zip");

        zip_tree(&tree, &zip_path, "").expect("zip");
        let archive = zip::ZipArchive::new(File::open(&zip_path).expect("open")).expect("zip");
        assert!(archive.file_names().any(|n| n == "languages.json"));
    }

    #[test]
    fn test_zip_tree_missing_source() {
        let temp = TempDir::new().expect("temp dir");
        let zip_path = temp.path().join("none.zip");
        let err = zip_tree(&temp.path().join("missing"), &zip_path, ARCHIVE_ROOT)
            .expect_err("should fail");
        assert!(matches!(
            err,
            Error::Archive(ArchiveError::SourceNotDirectory { .. })
        ));
        assert!(!zip_path.exists());
    }

    #[test]
    fn test_entry_name_joins_with_slashes() {
        let rel = Path::new("en").join("images").join("cover.png");
        assert_eq!(entry_name("content", &rel), "content/en/images/cover.png");
        assert_eq!(entry_name("", &rel), "en/images/cover.png");
    }
}
