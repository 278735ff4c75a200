//! A [`ContentSource`] backed by a JSON catalog file.
//!
//! The catalog lists packages plus per-locale collections and singles.
//! Asset paths are resolved relative to the catalog's directory; assets
//! without an explicit `url` get one built from the configured base URL.
//!
//! ```json
//! {
//!   "packages": [{ "slug": "sports", "name": "Sports" }],
//!   "collections": [{
//!     "locale": "en", "slug": "soccer", "title": "Soccer", "mediaType": "audio",
//!     "packages": ["sports"], "image": { "path": "images/soccer.png" },
//!     "episodes": [{ "slug": "final", "title": "Final", "mediaType": "audio",
//!                    "image": { "path": "images/final.png" },
//!                    "media": { "path": "media/final.mp3" } }]
//!   }],
//!   "singles": []
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::asset::Asset;
use crate::collection::Collection;
use crate::episode::Episode;
use crate::error::{ContentError, Result};
use crate::fs::read_error;
use crate::package::PackageInfo;
use crate::single::Single;
use crate::source::ContentSource;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCatalog {
    packages: Vec<PackageInfo>,
    collections: Vec<RawCollection>,
    singles: Vec<RawSingle>,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    path: PathBuf,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEpisode {
    slug: String,
    title: String,
    #[serde(default)]
    desc: String,
    media_type: String,
    #[serde(default)]
    tags: Vec<String>,
    image: RawAsset,
    media: RawAsset,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCollection {
    locale: String,
    slug: String,
    title: String,
    #[serde(default)]
    desc: String,
    media_type: String,
    #[serde(default)]
    recommended: bool,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    packages: Vec<String>,
    image: RawAsset,
    #[serde(default)]
    episodes: Vec<RawEpisode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSingle {
    locale: String,
    slug: String,
    title: String,
    #[serde(default)]
    desc: String,
    media_type: String,
    #[serde(default)]
    recommended: bool,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    packages: Vec<String>,
    image: RawAsset,
    media: RawAsset,
}

/// Content source reading a JSON catalog.
#[derive(Debug)]
pub struct JsonCatalog {
    base_dir: PathBuf,
    base_url: String,
    raw: RawCatalog,
}

impl JsonCatalog {
    /// Load a catalog file. Relative asset paths resolve against its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid catalog.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| read_error(path, e))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let catalog = Self::parse(&content, base_dir)?;
        info!(
            "Loaded catalog {} ({} packages, {} collections, {} singles)",
            path.display(),
            catalog.raw.packages.len(),
            catalog.raw.collections.len(),
            catalog.raw.singles.len()
        );
        Ok(catalog)
    }

    /// Like [`JsonCatalog::load`], but a missing file yields an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and cannot be read or parsed.
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        debug!("No catalog at {}, using an empty one", path.display());
        Ok(Self {
            base_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            base_url: String::new(),
            raw: RawCatalog::default(),
        })
    }

    /// Parse catalog JSON, resolving relative asset paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidCatalog`] if the JSON does not match the
    /// catalog shape.
    pub fn parse(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let raw: RawCatalog =
            serde_json::from_str(json).map_err(|e| ContentError::InvalidCatalog(e.to_string()))?;
        Ok(Self {
            base_dir: base_dir.into(),
            base_url: String::new(),
            raw,
        })
    }

    /// Base URL used for assets that have no explicit `url`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn resolve(&self, raw: &RawAsset) -> (PathBuf, String) {
        let path = if raw.path.is_absolute() {
            raw.path.clone()
        } else {
            self.base_dir.join(&raw.path)
        };
        let url = raw.url.clone().unwrap_or_else(|| {
            let relative = raw.path.to_string_lossy().replace('\\', "/");
            if self.base_url.is_empty() {
                relative
            } else {
                format!(
                    "{}/{}",
                    self.base_url.trim_end_matches('/'),
                    relative.trim_start_matches('/')
                )
            }
        });
        (path, url)
    }

    fn image(&self, raw: &RawAsset) -> Result<Asset> {
        let (path, url) = self.resolve(raw);
        Asset::image(path, url)
    }

    fn media(&self, raw: &RawAsset) -> Result<Asset> {
        let (path, url) = self.resolve(raw);
        Asset::media(path, url)
    }

    fn build_episode(&self, raw: &RawEpisode) -> Result<Episode> {
        let mut episode = Episode::new(
            raw.slug.clone(),
            raw.title.clone(),
            raw.media_type.clone(),
            self.image(&raw.image)?,
            self.media(&raw.media)?,
        )
        .with_desc(raw.desc.clone());
        for tag in &raw.tags {
            episode.add_tag(tag.clone());
        }
        Ok(episode)
    }

    fn build_collection(&self, raw: &RawCollection) -> Result<Collection> {
        let mut collection = Collection::new(
            raw.slug.clone(),
            raw.title.clone(),
            raw.media_type.clone(),
            self.image(&raw.image)?,
        )
        .with_desc(raw.desc.clone())
        .recommended(raw.recommended);
        for category in &raw.categories {
            collection.add_category(category.clone());
        }
        for tag in &raw.tags {
            collection.add_tag(tag.clone());
        }
        for package in &raw.packages {
            collection.add_package(package.clone());
        }
        for episode in &raw.episodes {
            collection.add_episode(self.build_episode(episode)?);
        }
        Ok(collection)
    }

    fn build_single(&self, raw: &RawSingle) -> Result<Single> {
        let mut single = Single::new(
            raw.slug.clone(),
            raw.title.clone(),
            raw.media_type.clone(),
            self.image(&raw.image)?,
            self.media(&raw.media)?,
        )
        .with_desc(raw.desc.clone())
        .recommended(raw.recommended);
        for category in &raw.categories {
            single.add_category(category.clone());
        }
        for tag in &raw.tags {
            single.add_tag(tag.clone());
        }
        for package in &raw.packages {
            single.add_package(package.clone());
        }
        Ok(single)
    }
}

impl ContentSource for JsonCatalog {
    fn packages(&self) -> Result<Vec<PackageInfo>> {
        Ok(self.raw.packages.clone())
    }

    fn find_package(&self, slug: &str) -> Result<Option<PackageInfo>> {
        Ok(self.raw.packages.iter().find(|p| p.slug == slug).cloned())
    }

    fn collections(&self, locale: &str) -> Result<Vec<Collection>> {
        debug!("Reading collections for locale {}", locale);
        self.raw
            .collections
            .iter()
            .filter(|c| c.locale == locale)
            .map(|c| self.build_collection(c))
            .collect()
    }

    fn singles(&self, locale: &str) -> Result<Vec<Single>> {
        debug!("Reading singles for locale {}", locale);
        self.raw
            .singles
            .iter()
            .filter(|s| s.locale == locale)
            .map(|s| self.build_single(s))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    const CATALOG: &str = r#"{
        "packages": [{ "slug": "sports", "name": "Sports" }],
        "collections": [{
            "locale": "en", "slug": "soccer", "title": "Soccer", "mediaType": "audio",
            "tags": ["ball", "ball"], "packages": ["sports"],
            "image": { "path": "soccer.png" },
            "episodes": [{
                "slug": "final", "title": "Final", "mediaType": "audio",
                "image": { "path": "final.png", "url": "https://cdn.example.org/final.png" },
                "media": { "path": "final.mp3" }
            }]
        }],
        "singles": [{
            "locale": "fr", "slug": "match", "title": "Match", "mediaType": "video",
            "packages": ["sports"],
            "image": { "path": "match.png" }, "media": { "path": "match.mp4" }
        }]
    }"#;

    fn fixture() -> TempDir {
        let temp = TempDir::new().expect("temp dir");
        for name in ["soccer.png", "final.png", "final.mp3", "match.png", "match.mp4"] {
            fs::write(temp.path().join(name), name).expect("write");
        }
        temp
    }

    #[test]
    fn test_collections_by_locale() {
        let temp = fixture();
        let catalog = JsonCatalog::parse(CATALOG, temp.path())
            .expect("parse")
            .with_base_url("https://example.org/");

        let collections = catalog.collections("en").expect("collections");
        assert_eq!(collections.len(), 1);
        let soccer = &collections[0];
        assert_eq!(soccer.slug, "collection-soccer");
        assert_eq!(soccer.tags(), ["ball"]);
        assert!(soccer.belongs_to("sports"));
        assert_eq!(soccer.image().url(), "https://example.org/soccer.png");
        assert_eq!(
            soccer.episodes()[0].image().url(),
            "https://cdn.example.org/final.png"
        );
        assert!(catalog.collections("fr").expect("collections").is_empty());
    }

    #[test]
    fn test_singles_by_locale() {
        let temp = fixture();
        let catalog = JsonCatalog::parse(CATALOG, temp.path()).expect("parse");
        let singles = catalog.singles("fr").expect("singles");
        assert_eq!(singles.len(), 1);
        assert_eq!(singles[0].media().mime_type(), "video/mp4");
        assert_eq!(singles[0].media().url(), "match.mp4");
    }

    #[test]
    fn test_find_package() {
        let catalog = JsonCatalog::parse(CATALOG, ".").expect("parse");
        assert_eq!(
            catalog.find_package("sports").expect("lookup"),
            Some(PackageInfo::new("sports", "Sports"))
        );
        assert_eq!(catalog.find_package("news").expect("lookup"), None);
    }

    #[test]
    fn test_missing_asset_fails() {
        let temp = TempDir::new().expect("temp dir");
        let catalog = JsonCatalog::parse(CATALOG, temp.path()).expect("parse");
        assert!(matches!(
            catalog.collections("en"),
            Err(Error::Content(ContentError::MissingAsset { .. }))
        ));
    }

    #[test]
    fn test_invalid_catalog() {
        assert!(matches!(
            JsonCatalog::parse(r#"{"packages": 3}"#, "."),
            Err(Error::Content(ContentError::InvalidCatalog(_)))
        ));
    }

    #[test]
    fn test_load_or_empty_without_file() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("catalog.json");
        assert!(JsonCatalog::load(&path).is_err());

        let catalog = JsonCatalog::load_or_empty(&path).expect("empty");
        assert!(catalog.packages().expect("packages").is_empty());
        assert_eq!(catalog.find_package("sports").expect("lookup"), None);
    }

    #[test]
    fn test_load_or_empty_still_rejects_bad_file() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("catalog.json");
        fs::write(&path, r#"{"packages": 3}"#).expect("write");
        assert!(matches!(
            JsonCatalog::load_or_empty(&path),
            Err(Error::Content(ContentError::InvalidCatalog(_)))
        ));
    }

    #[test]
    fn test_load_resolves_against_file_dir() {
        let temp = fixture();
        let path = temp.path().join("catalog.json");
        fs::write(&path, CATALOG).expect("write");
        let catalog = JsonCatalog::load(&path).expect("load");
        assert_eq!(catalog.singles("fr").expect("singles").len(), 1);
    }
}
