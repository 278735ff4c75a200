//! JSON projections of content written into archives.
//!
//! Each archive carries two views of every item: a detail file
//! (`data/<slug>.json`) and a summary entry in the locale manifest
//! (`data/main.json`). Full archives reference bundled files by name; slim
//! archives additionally carry the remote URLs the interface app downloads
//! from. Singles serialize identically in both views.

use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::episode::Episode;
use crate::single::Single;

/// Packaging mode of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Media and images are bundled into the archive.
    #[default]
    Full,
    /// Media and images are referenced through remote URLs.
    Slim,
}

impl ExportMode {
    /// Is this a slim export?
    #[must_use]
    pub const fn is_slim(self) -> bool {
        matches!(self, Self::Slim)
    }

    /// Mode from the slim flag used in file names.
    #[must_use]
    pub const fn from_slim(is_slim: bool) -> Self {
        if is_slim { Self::Slim } else { Self::Full }
    }
}

impl std::fmt::Display for ExportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Slim => write!(f, "slim"),
        }
    }
}

/// Episode as written inside a full collection detail file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullEpisode<'a> {
    desc: &'a str,
    filename: &'a str,
    image: &'a str,
    media_type: &'a str,
    mime_type: &'a str,
    slug: &'a str,
    tags: &'a [String],
    title: &'a str,
}

impl<'a> From<&'a Episode> for FullEpisode<'a> {
    fn from(episode: &'a Episode) -> Self {
        Self {
            desc: &episode.desc,
            filename: episode.media().file_name(),
            image: episode.image().file_name(),
            media_type: &episode.media_type,
            mime_type: episode.media().mime_type(),
            slug: &episode.slug,
            tags: episode.tags(),
            title: &episode.title,
        }
    }
}

/// Episode as written inside a slim collection detail file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlimEpisode<'a> {
    #[serde(flatten)]
    episode: FullEpisode<'a>,
    image_url: &'a str,
    resource_url: &'a str,
}

impl<'a> From<&'a Episode> for SlimEpisode<'a> {
    fn from(episode: &'a Episode) -> Self {
        Self {
            episode: FullEpisode::from(episode),
            image_url: episode.image().url(),
            resource_url: episode.media().url(),
        }
    }
}

/// Fields shared by every collection projection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionFields<'a> {
    categories: &'a [String],
    desc: &'a str,
    image: &'a str,
    media_type: &'a str,
    slug: &'a str,
    tags: &'a [String],
    title: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    recommended: bool,
}

impl<'a> From<&'a Collection> for CollectionFields<'a> {
    fn from(collection: &'a Collection) -> Self {
        Self {
            categories: collection.categories(),
            desc: &collection.desc,
            image: collection.image().file_name(),
            media_type: &collection.media_type,
            slug: &collection.slug,
            tags: collection.tags(),
            title: &collection.title,
            recommended: collection.recommended,
        }
    }
}

/// Full-mode collection detail: all fields plus every episode.
#[derive(Debug, Serialize)]
pub struct FullCollectionDetail<'a> {
    #[serde(flatten)]
    fields: CollectionFields<'a>,
    episodes: Vec<FullEpisode<'a>>,
}

impl<'a> From<&'a Collection> for FullCollectionDetail<'a> {
    fn from(collection: &'a Collection) -> Self {
        Self {
            fields: CollectionFields::from(collection),
            episodes: collection.episodes().iter().map(FullEpisode::from).collect(),
        }
    }
}

/// Full-mode collection summary: no episode list.
#[derive(Debug, Serialize)]
pub struct FullCollectionSummary<'a> {
    #[serde(flatten)]
    fields: CollectionFields<'a>,
}

impl<'a> From<&'a Collection> for FullCollectionSummary<'a> {
    fn from(collection: &'a Collection) -> Self {
        Self {
            fields: CollectionFields::from(collection),
        }
    }
}

/// Slim-mode collection detail: episodes carry remote URLs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlimCollectionDetail<'a> {
    #[serde(flatten)]
    fields: CollectionFields<'a>,
    episodes: Vec<SlimEpisode<'a>>,
    image_url: &'a str,
}

impl<'a> From<&'a Collection> for SlimCollectionDetail<'a> {
    fn from(collection: &'a Collection) -> Self {
        Self {
            fields: CollectionFields::from(collection),
            episodes: collection.episodes().iter().map(SlimEpisode::from).collect(),
            image_url: collection.image().url(),
        }
    }
}

/// Slim-mode collection summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlimCollectionSummary<'a> {
    #[serde(flatten)]
    fields: CollectionFields<'a>,
    image_url: &'a str,
}

impl<'a> From<&'a Collection> for SlimCollectionSummary<'a> {
    fn from(collection: &'a Collection) -> Self {
        Self {
            fields: CollectionFields::from(collection),
            image_url: collection.image().url(),
        }
    }
}

/// Full-mode single, used for both the detail file and the manifest.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSingle<'a> {
    categories: &'a [String],
    desc: &'a str,
    filename: &'a str,
    image: &'a str,
    media_type: &'a str,
    mime_type: &'a str,
    slug: &'a str,
    tags: &'a [String],
    title: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    recommended: bool,
}

impl<'a> From<&'a Single> for FullSingle<'a> {
    fn from(single: &'a Single) -> Self {
        Self {
            categories: single.categories(),
            desc: &single.desc,
            filename: single.media().file_name(),
            image: single.image().file_name(),
            media_type: &single.media_type,
            mime_type: single.media().mime_type(),
            slug: &single.slug,
            tags: single.tags(),
            title: &single.title,
            recommended: single.recommended,
        }
    }
}

/// Slim-mode single, used for both the detail file and the manifest.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlimSingle<'a> {
    #[serde(flatten)]
    single: FullSingle<'a>,
    image_url: &'a str,
    resource_url: &'a str,
}

impl<'a> From<&'a Single> for SlimSingle<'a> {
    fn from(single: &'a Single) -> Self {
        Self {
            single: FullSingle::from(single),
            image_url: single.image().url(),
            resource_url: single.media().url(),
        }
    }
}

/// The per-locale manifest written to `data/main.json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleManifest<'a> {
    /// Package display name.
    pub item_name: &'a str,
    /// Summary entries in insertion order.
    pub content: &'a [serde_json::Value],
}

/// Detail JSON for a collection in the given mode.
pub fn collection_detail(collection: &Collection, mode: ExportMode) -> serde_json::Result<String> {
    match mode {
        ExportMode::Full => serde_json::to_string(&FullCollectionDetail::from(collection)),
        ExportMode::Slim => serde_json::to_string(&SlimCollectionDetail::from(collection)),
    }
}

/// Manifest entry for a collection in the given mode.
pub fn collection_summary(
    collection: &Collection,
    mode: ExportMode,
) -> serde_json::Result<serde_json::Value> {
    match mode {
        ExportMode::Full => serde_json::to_value(FullCollectionSummary::from(collection)),
        ExportMode::Slim => serde_json::to_value(SlimCollectionSummary::from(collection)),
    }
}

/// Detail JSON for a single in the given mode.
pub fn single_detail(single: &Single, mode: ExportMode) -> serde_json::Result<String> {
    match mode {
        ExportMode::Full => serde_json::to_string(&FullSingle::from(single)),
        ExportMode::Slim => serde_json::to_string(&SlimSingle::from(single)),
    }
}

/// Manifest entry for a single in the given mode.
pub fn single_summary(single: &Single, mode: ExportMode) -> serde_json::Result<serde_json::Value> {
    match mode {
        ExportMode::Full => serde_json::to_value(FullSingle::from(single)),
        ExportMode::Slim => serde_json::to_value(SlimSingle::from(single)),
    }
}
