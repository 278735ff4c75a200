//! Singles: standalone content with one media file.

use crate::asset::Asset;
use crate::package::push_unique;

/// A standalone piece of content with exactly one media asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Single {
    /// Single slug.
    pub slug: String,
    /// Single title.
    pub title: String,
    /// Single description.
    pub desc: String,
    /// Kind of media.
    pub media_type: String,
    /// Whether the single is recommended.
    pub recommended: bool,
    categories: Vec<String>,
    tags: Vec<String>,
    image: Asset,
    media: Asset,
    packages: Vec<String>,
}

impl Single {
    /// Create a single from already validated assets.
    #[must_use]
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        media_type: impl Into<String>,
        image: Asset,
        media: Asset,
    ) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            desc: String::new(),
            media_type: media_type.into(),
            recommended: false,
            categories: Vec::new(),
            tags: Vec::new(),
            image,
            media,
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

    /// Does this single belong to the given package?
    #[must_use]
    pub fn belongs_to(&self, package_slug: &str) -> bool {
        self.packages.iter().any(|p| p == package_slug)
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

    /// Package slugs this single belongs to.
    #[must_use]
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// The single's image.
    #[must_use]
    pub const fn image(&self) -> &Asset {
        &self.image
    }

    /// The single's media file.
    #[must_use]
    pub const fn media(&self) -> &Asset {
        &self.media
    }
}
