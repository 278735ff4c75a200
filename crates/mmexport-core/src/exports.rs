//! Listing and housekeeping of produced archives.
//!
//! There is no index of past exports: every listing scans the exports
//! directory and decodes the archive file names. Files whose names do not
//! decode are left alone.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ExporterConfig;
use crate::error::{FileSystemError, Result};
use crate::filename::{self, ARCHIVE_EXTENSION};
use crate::fs::{read_error, remove_file, rename};
use crate::package::PackageInfo;
use crate::source::ContentSource;

/// Format of [`PackageExport::date`], e.g. `Mar 4, 2021 1:05 PM`.
pub const DISPLAY_DATE_FORMAT: &str = "%b %-d, %Y %-I:%M %p";

/// An archive found in the exports directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageExport {
    /// Absolute path of the archive.
    pub path: PathBuf,
    /// Archive file name.
    pub file_name: String,
    /// Human readable export date.
    pub date: String,
    /// Export time as a unix timestamp.
    pub timestamp: i64,
    /// Whether this is a slim archive.
    pub is_slim: bool,
    /// The package the archive belongs to.
    pub package: PackageInfo,
    /// URL path the archive is served from.
    pub public_path: String,
}

/// Scans and manages the archives of one exports directory.
pub struct PackageExportsStore<'a, S: ContentSource + ?Sized> {
    dir: PathBuf,
    date_format: String,
    public_path: String,
    source: &'a S,
}

impl<'a, S: ContentSource + ?Sized> PackageExportsStore<'a, S> {
    /// Create a store over `dir`.
    pub fn new(
        dir: impl Into<PathBuf>,
        date_format: impl Into<String>,
        public_path: impl Into<String>,
        source: &'a S,
    ) -> Self {
        Self {
            dir: dir.into(),
            date_format: date_format.into(),
            public_path: public_path.into(),
            source,
        }
    }

    /// Create a store over the configured exports directory.
    pub fn from_config(config: &ExporterConfig, source: &'a S) -> Self {
        Self::new(
            config.exports_dir(),
            config.file_date_suffix.clone(),
            config.public_path.clone(),
            source,
        )
    }

    /// Directory being scanned.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every archive with a decodable name, in directory order.
    ///
    /// A missing exports directory yields an empty list.
    pub fn find_all(&self) -> Result<Vec<PackageExport>> {
        if !self.dir.is_dir() {
            debug!("Exports directory {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| read_error(&self.dir, e))?;
        let mut packages: HashMap<String, PackageInfo> = HashMap::new();
        let mut exports = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| read_error(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.ends_with(ARCHIVE_EXTENSION) {
                continue;
            }
            let Some(decoded) = filename::decode(file_name, &self.date_format) else {
                debug!("Skipping undecodable archive name {}", file_name);
                continue;
            };

            let package = if let Some(info) = packages.get(&decoded.slug) {
                info.clone()
            } else {
                let info = self
                    .source
                    .find_package(&decoded.slug)?
                    .unwrap_or_else(|| PackageInfo::placeholder(&decoded.slug));
                packages.insert(decoded.slug.clone(), info.clone());
                info
            };

            exports.push(PackageExport {
                file_name: file_name.to_string(),
                date: decoded.exported_on.format(DISPLAY_DATE_FORMAT).to_string(),
                timestamp: decoded.exported_on.timestamp(),
                is_slim: decoded.is_slim,
                public_path: self.public_path_for(file_name),
                path,
                package,
            });
        }

        Ok(exports)
    }

    /// Archives of one package.
    pub fn find_by_slug(&self, slug: &str) -> Result<Vec<PackageExport>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|e| e.package.slug == slug)
            .collect())
    }

    /// Archives grouped by package slug, newest first within each group.
    pub fn list_grouped(&self) -> Result<BTreeMap<String, Vec<PackageExport>>> {
        let mut groups: BTreeMap<String, Vec<PackageExport>> = BTreeMap::new();
        for export in self.find_all()? {
            groups
                .entry(export.package.slug.clone())
                .or_default()
                .push(export);
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        Ok(groups)
    }

    /// All archives sorted by package name, full before slim, newest first.
    pub fn list_by_package_name(&self) -> Result<Vec<PackageExport>> {
        let mut exports = self.find_all()?;
        exports.sort_by(by_package_name);
        Ok(exports)
    }

    /// Delete every archive of `slug`. Returns true when none remain.
    pub fn destroy(&self, slug: &str) -> Result<bool> {
        for export in self.find_by_slug(slug)? {
            info!("Deleting archive {}", export.file_name);
            remove_file(&export.path)?;
        }
        Ok(self.find_by_slug(slug)?.is_empty())
    }

    /// Delete every archive. Returns true when none remain.
    pub fn destroy_all(&self) -> Result<bool> {
        for export in self.find_all()? {
            info!("Deleting archive {}", export.file_name);
            remove_file(&export.path)?;
        }
        Ok(self.find_all()?.is_empty())
    }

    /// Rename every archive of `old_slug` to a name for `new_slug`.
    ///
    /// The slim flag and export date of each archive are kept. Returns the
    /// new paths.
    pub fn update_slug(&self, old_slug: &str, new_slug: &str) -> Result<Vec<PathBuf>> {
        let mut renamed = Vec::new();
        for export in self.find_by_slug(old_slug)? {
            let Some(decoded) = filename::decode(&export.file_name, &self.date_format) else {
                continue;
            };
            let new_name = filename::encode_at(
                new_slug,
                &self.date_format,
                export.is_slim,
                decoded.exported_on,
            );
            let new_path = self.dir.join(&new_name);
            info!("Renaming archive {} to {}", export.file_name, new_name);
            rename(&export.path, &new_path)?;
            renamed.push(new_path);
        }
        Ok(renamed)
    }

    /// Delete one archive by file name.
    pub fn delete_file(&self, file_name: &str) -> Result<()> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name == ".." {
            return Err(FileSystemError::InvalidPath {
                path: PathBuf::from(file_name),
                reason: "expected a bare archive file name".to_string(),
            }
            .into());
        }
        let path = self.dir.join(file_name);
        if !path.is_file() {
            return Err(FileSystemError::NotFound { path }.into());
        }
        info!("Deleting archive {}", file_name);
        remove_file(&path)
    }

    fn public_path_for(&self, file_name: &str) -> String {
        if self.public_path.ends_with('/') {
            format!("{}{}", self.public_path, file_name)
        } else {
            format!("{}/{}", self.public_path, file_name)
        }
    }
}

fn by_package_name(a: &PackageExport, b: &PackageExport) -> Ordering {
    a.package
        .name
        .cmp(&b.package.name)
        .then(a.is_slim.cmp(&b.is_slim))
        .then(b.timestamp.cmp(&a.timestamp))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::filename::DEFAULT_FILE_DATE_FORMAT;
    use crate::source::MockContentSource;
    use chrono::{DateTime, Local, TimeZone};
    use tempfile::TempDir;

    fn at(d: u32, h: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2021, 3, d, h, 5, 0)
            .earliest()
            .unwrap_or_else(Local::now)
    }

    fn touch(dir: &Path, slug: &str, is_slim: bool, when: DateTime<Local>) -> String {
        let name = filename::encode_at(slug, DEFAULT_FILE_DATE_FORMAT, is_slim, when);
        fs::write(dir.join(&name), "zip").expect("write");
        name
    }

    fn source() -> MockContentSource {
        let mut source = MockContentSource::new();
        source.expect_find_package().returning(|slug| {
            Ok(match slug {
                "sports" => Some(PackageInfo::new("sports", "Sports")),
                "arts" => Some(PackageInfo::new("arts", "Zebra Arts")),
                _ => None,
            })
        });
        source
    }

    fn store<'a>(dir: &Path, source: &'a MockContentSource) -> PackageExportsStore<'a, MockContentSource> {
        PackageExportsStore::new(dir, DEFAULT_FILE_DATE_FORMAT, "/files/exports/", source)
    }

    #[test]
    fn test_find_all_skips_foreign_files() {
        let temp = TempDir::new().expect("temp dir");
        touch(temp.path(), "sports", false, at(4, 13));
        fs::write(temp.path().join("notes.txt"), "x").expect("write");
        fs::write(temp.path().join("broken.zip"), "x").expect("write");
        fs::write(temp.path().join("sports_tomorrow.zip"), "x").expect("write");
        fs::create_dir(temp.path().join("sports_03-04-2021-13-05")).expect("mkdir");

        let source = source();
        let exports = store(temp.path(), &source).find_all().expect("find");
        assert_eq!(exports.len(), 1);
        let export = &exports[0];
        assert_eq!(export.package, PackageInfo::new("sports", "Sports"));
        assert_eq!(export.date, "Mar 4, 2021 1:05 PM");
        assert_eq!(export.timestamp, at(4, 13).timestamp());
        assert!(!export.is_slim);
        assert_eq!(
            export.public_path,
            "/files/exports/sports_03-04-2021-13-05.zip"
        );
    }

    #[test]
    fn test_find_all_missing_dir_is_empty() {
        let temp = TempDir::new().expect("temp dir");
        let source = MockContentSource::new();
        let exports = store(&temp.path().join("missing"), &source)
            .find_all()
            .expect("find");
        assert!(exports.is_empty());
    }

    #[test]
    fn test_unknown_package_gets_placeholder() {
        let temp = TempDir::new().expect("temp dir");
        touch(temp.path(), "retired", true, at(4, 13));
        let source = source();
        let exports = store(temp.path(), &source).find_all().expect("find");
        assert_eq!(exports[0].package, PackageInfo::placeholder("retired"));
    }

    #[test]
    fn test_package_lookup_once_per_slug() {
        let temp = TempDir::new().expect("temp dir");
        touch(temp.path(), "sports", false, at(4, 13));
        touch(temp.path(), "sports", true, at(4, 13));
        touch(temp.path(), "sports", false, at(5, 9));

        let mut source = MockContentSource::new();
        source
            .expect_find_package()
            .times(1)
            .returning(|_| Ok(Some(PackageInfo::new("sports", "Sports"))));
        assert_eq!(store(temp.path(), &source).find_all().expect("find").len(), 3);
    }

    #[test]
    fn test_list_grouped_order() {
        let temp = TempDir::new().expect("temp dir");
        touch(temp.path(), "sports", false, at(4, 13));
        touch(temp.path(), "sports", false, at(6, 13));
        touch(temp.path(), "arts", true, at(5, 13));

        let source = source();
        let groups = store(temp.path(), &source).list_grouped().expect("list");
        let slugs: Vec<&String> = groups.keys().collect();
        assert_eq!(slugs, ["arts", "sports"]);
        let sports = &groups["sports"];
        assert!(sports[0].timestamp > sports[1].timestamp);
    }

    #[test]
    fn test_list_by_package_name() {
        let temp = TempDir::new().expect("temp dir");
        touch(temp.path(), "arts", false, at(4, 13));
        touch(temp.path(), "sports", true, at(4, 13));
        touch(temp.path(), "sports", false, at(4, 13));

        let source = source();
        let exports = store(temp.path(), &source)
            .list_by_package_name()
            .expect("list");
        let order: Vec<(&str, bool)> = exports
            .iter()
            .map(|e| (e.package.name.as_str(), e.is_slim))
            .collect();
        assert_eq!(
            order,
            [("Sports", false), ("Sports", true), ("Zebra Arts", false)]
        );
    }

    #[test]
    fn test_destroy_by_slug() {
        let temp = TempDir::new().expect("temp dir");
        touch(temp.path(), "sports", false, at(4, 13));
        touch(temp.path(), "sports", true, at(4, 13));
        let arts = touch(temp.path(), "arts", false, at(4, 13));

        let source = source();
        let store = store(temp.path(), &source);
        assert!(store.destroy("sports").expect("destroy"));
        assert!(temp.path().join(arts).exists());
        assert_eq!(store.find_all().expect("find").len(), 1);

        assert!(store.destroy_all().expect("destroy all"));
        assert!(store.find_all().expect("find").is_empty());
    }

    #[test]
    fn test_update_slug_keeps_flag_and_date() {
        let temp = TempDir::new().expect("temp dir");
        touch(temp.path(), "sports", false, at(4, 13));
        touch(temp.path(), "sports", true, at(5, 13));

        let source = source();
        let store = store(temp.path(), &source);
        let renamed = store.update_slug("sports", "athletics").expect("rename");
        assert_eq!(renamed.len(), 2);
        assert!(store.find_by_slug("sports").expect("find").is_empty());
        assert!(temp.path().join("athletics_03-04-2021-13-05.zip").exists());
        assert!(temp.path().join("slim_athletics_03-05-2021-13-05.zip").exists());
    }

    #[test]
    fn test_date_only_format_is_listed_and_destroyed() {
        let temp = TempDir::new().expect("temp dir");
        let name = filename::encode_at("sports", "%Y-%m-%d", false, at(4, 13));
        fs::write(temp.path().join(&name), "zip").expect("write");

        let source = source();
        let store = PackageExportsStore::new(temp.path(), "%Y-%m-%d", "/files/exports/", &source);
        let exports = store.find_all().expect("find");
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].file_name, "sports_2021-03-04.zip");
        assert_eq!(exports[0].date, "Mar 4, 2021 12:00 AM");

        assert!(store.destroy("sports").expect("destroy"));
        assert!(!temp.path().join(&name).exists());
    }

    #[test]
    fn test_delete_file() {
        let temp = TempDir::new().expect("temp dir");
        let name = touch(temp.path(), "sports", false, at(4, 13));
        let source = MockContentSource::new();
        let store = store(temp.path(), &source);

        store.delete_file(&name).expect("delete");
        assert!(!temp.path().join(&name).exists());
        assert!(matches!(
            store.delete_file(&name),
            Err(Error::FileSystem(FileSystemError::NotFound { .. }))
        ));
        assert!(matches!(
            store.delete_file("../config.json"),
            Err(Error::FileSystem(FileSystemError::InvalidPath { .. }))
        ));
    }
}
