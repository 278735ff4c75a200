//! Episodes: the media items inside a collection.

use crate::asset::Asset;
use crate::package::push_unique;

/// One media item belonging to a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    /// Episode slug.
    pub slug: String,
    /// Episode title.
    pub title: String,
    /// Episode description.
    pub desc: String,
    /// Kind of media (audio, video, ...), as labelled by the content store.
    pub media_type: String,
    tags: Vec<String>,
    image: Asset,
    media: Asset,
}

impl Episode {
    /// Create an episode from already validated assets.
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
            tags: Vec::new(),
            image,
            media,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Add a tag, ignoring duplicates.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        push_unique(&mut self.tags, tag.into());
    }

    /// Tags in insertion order.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// The episode's image.
    #[must_use]
    pub const fn image(&self) -> &Asset {
        &self.image
    }

    /// The episode's media file.
    #[must_use]
    pub const fn media(&self) -> &Asset {
        &self.media
    }
}
