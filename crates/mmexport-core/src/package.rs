//! Packages: the exportable unit, grouping collections and singles per locale.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::single::Single;

/// Identity of a package, without any content attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package slug.
    pub slug: String,
    /// Package display name.
    pub name: String,
}

impl PackageInfo {
    /// Create package info.
    #[must_use]
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
        }
    }

    /// Stand-in for a package that no longer exists: the slug doubles as name.
    #[must_use]
    pub fn placeholder(slug: &str) -> Self {
        Self::new(slug, slug)
    }
}

/// A named grouping of collections and singles, keyed by locale code.
#[derive(Debug, Clone, Default)]
pub struct Package {
    /// Package slug.
    pub slug: String,
    /// Package display name.
    pub name: String,
    collections: HashMap<String, Vec<Collection>>,
    singles: HashMap<String, Vec<Single>>,
    locales: Vec<String>,
}

impl Package {
    /// Create an empty package.
    #[must_use]
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Identity of this package.
    #[must_use]
    pub fn info(&self) -> PackageInfo {
        PackageInfo::new(self.slug.clone(), self.name.clone())
    }

    /// Add a collection under a locale.
    pub fn add_collection(&mut self, locale: &str, collection: Collection) {
        self.collections
            .entry(locale.to_string())
            .or_default()
            .push(collection);
        push_unique(&mut self.locales, locale.to_string());
    }

    /// Add a single under a locale.
    pub fn add_single(&mut self, locale: &str, single: Single) {
        self.singles
            .entry(locale.to_string())
            .or_default()
            .push(single);
        push_unique(&mut self.locales, locale.to_string());
    }

    /// Collections for a locale, in insertion order.
    #[must_use]
    pub fn collections_for(&self, locale: &str) -> &[Collection] {
        self.collections.get(locale).map(Vec::as_slice).unwrap_or_default()
    }

    /// Singles for a locale, in insertion order.
    #[must_use]
    pub fn singles_for(&self, locale: &str) -> &[Single] {
        self.singles.get(locale).map(Vec::as_slice).unwrap_or_default()
    }

    /// Does this package have a collection or single for the locale?
    #[must_use]
    pub fn has_content_for(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    /// Locales with at least one collection or single, in first-seen order.
    #[must_use]
    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    /// True when the package holds no collections and no singles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.singles.is_empty()
    }
}

/// Push `value` unless an equal element is already present.
pub(crate) fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use std::fs;
    use tempfile::TempDir;

    fn single(temp: &TempDir, slug: &str) -> Single {
        let image = temp.path().join(format!("{slug}.png"));
        let media = temp.path().join(format!("{slug}.mp3"));
        fs::write(&image, "png").expect("write");
        fs::write(&media, "mp3").expect("write");
        Single::new(
            slug,
            slug.to_uppercase(),
            "audio",
            Asset::image(image, "").expect("image"),
            Asset::media(media, "").expect("media"),
        )
    }

    #[test]
    fn test_is_empty_until_first_add() {
        let temp = TempDir::new().expect("temp dir");
        let mut package = Package::new("sports", "Sports");
        assert!(package.is_empty());
        assert!(package.locales().is_empty());

        package.add_single("en", single(&temp, "match"));
        assert!(!package.is_empty());
    }

    #[test]
    fn test_locales_track_content() {
        let temp = TempDir::new().expect("temp dir");
        let mut package = Package::new("sports", "Sports");
        package.add_single("en", single(&temp, "one"));
        package.add_single("en", single(&temp, "two"));
        package.add_single("fr", single(&temp, "trois"));

        assert_eq!(package.locales(), ["en", "fr"]);
        assert!(package.has_content_for("en"));
        assert!(!package.has_content_for("es"));
        assert_eq!(package.singles_for("en").len(), 2);
        assert!(package.collections_for("en").is_empty());
        assert!(package.singles_for("es").is_empty());
    }

    #[test]
    fn test_placeholder_uses_slug_as_name() {
        let info = PackageInfo::placeholder("gone");
        assert_eq!(info.slug, "gone");
        assert_eq!(info.name, "gone");
    }
}
