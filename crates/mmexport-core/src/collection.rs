//! Collections: titled groups of episodes.

use crate::asset::Asset;
use crate::episode::Episode;
use crate::package::push_unique;

/// Prefix added to stored collection slugs so they never clash with singles.
pub const COLLECTION_SLUG_PREFIX: &str = "collection-";

/// A titled group of episodes sharing an image, tags and categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Exported slug (`collection-<stored_slug>`).
    pub slug: String,
    /// Slug as stored by the content store.
    pub stored_slug: String,
    /// Collection title.
    pub title: String,
    /// Collection description.
    pub desc: String,
    /// Kind of media held by the episodes.
    pub media_type: String,
    /// Whether the collection is recommended.
    pub recommended: bool,
    categories: Vec<String>,
    tags: Vec<String>,
    episodes: Vec<Episode>,
    image: Asset,
    packages: Vec<String>,
}

impl Collection {
    /// Create an empty collection.
    #[must_use]
    pub fn new(
        stored_slug: impl Into<String>,
        title: impl Into<String>,
        media_type: impl Into<String>,
        image: Asset,
    ) -> Self {
        let stored_slug = stored_slug.into();
        Self {
            slug: format!("{COLLECTION_SLUG_PREFIX}{stored_slug}"),
            stored_slug,
            title: title.into(),
            desc: String::new(),
            media_type: media_type.into(),
            recommended: false,
            categories: Vec::new(),
            tags: Vec::new(),
            episodes: Vec::new(),
            image,
            packages: Vec::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Mark as recommended.
    #[must_use]
    pub const fn recommended(mut self, recommended: bool) -> Self {
        self.recommended = recommended;
        self
    }

    /// Append an episode.
    pub fn add_episode(&mut self, episode: Episode) {
        self.episodes.push(episode);
    }

    /// Add a category, ignoring duplicates.
    pub fn add_category(&mut self, category: impl Into<String>) {
        push_unique(&mut self.categories, category.into());
    }

    /// Add a tag, ignoring duplicates.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        push_unique(&mut self.tags, tag.into());
    }

    /// Record membership in a package.
    pub fn add_package(&mut self, package_slug: impl Into<String>) {
        push_unique(&mut self.packages, package_slug.into());
    }

    /// Does this collection belong to the given package?
    #[must_use]
    pub fn belongs_to(&self, package_slug: &str) -> bool {
        self.packages.iter().any(|p| p == package_slug)
    }

    /// Episodes in order.
    #[must_use]
    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    /// Categories in insertion order.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Tags in insertion order.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Package slugs this collection belongs to.
    #[must_use]
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// The collection image.
    #[must_use]
    pub const fn image(&self) -> &Asset {
        &self.image
    }
}
