use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Placeholder used by sources for metadata the page did not provide.
pub const UNKNOWN: &str = "未知";

/// One title discovered on a catalog or home page.
///
/// `source_id` is only unique within the source that produced it; pair it
/// with the source name (see [`crate::mapping::CatalogKey`]) for a stable key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub source_id: String,
    pub title: String,
    pub cover_url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub rating: f32,
    pub year: String,
    pub studio: String,
    pub tags: Vec<String>,
}

impl CatalogItem {
    /// Build an item, refusing to do so when any of the identifying fields is blank.
    pub fn new(source_id: impl Into<String>, title: impl Into<String>, cover_url: impl Into<String>) -> Option<Self> {
        let (source_id, title, cover_url) = (source_id.into(), title.into(), cover_url.into());
        if source_id.trim().is_empty() || title.trim().is_empty() || cover_url.trim().is_empty() {
            return None;
        }
        Some(Self {
            source_id,
            title,
            cover_url,
            kind: String::new(),
            status: String::new(),
            description: String::new(),
            rating: 0.0,
            year: String::new(),
            studio: String::new(),
            tags: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub name: String,
    /// Play page address, not a stream. Feed it to `Source::scrape_video`.
    pub url: String,
}

/// One mirror line of a title, named the way the origin site names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub source_name: String,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailMetadata {
    pub year: String,
    pub tags: Vec<String>,
    pub status: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Default for DetailMetadata {
    fn default() -> Self {
        Self {
            year: UNKNOWN.to_string(),
            tags: Vec::new(),
            status: UNKNOWN.to_string(),
            description: String::new(),
            cover_url: None,
            category: None,
        }
    }
}

/// Everything a detail page yields for one title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailBundle {
    pub playlists: Vec<Playlist>,
    pub metadata: DetailMetadata,
}

impl DetailBundle {
    pub fn empty() -> Self { Self::default() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Directly playable media (m3u8, mp4, ...).
    Native,
    /// Must be embedded as a sub-document.
    Iframe,
}

/// A playable address plus the headers the origin CDN insists on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVideo {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: StreamKind,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeSection {
    pub title: String,
    pub items: Vec<CatalogItem>,
}

/// Home page contents. Sources either publish a fixed recommended/recent
/// pair or an arbitrary list of titled sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HomePage {
    Featured { recommended: Vec<CatalogItem>, recent: Vec<CatalogItem> },
    Sections { sections: Vec<HomeSection> },
}

impl Default for HomePage {
    fn default() -> Self { HomePage::Sections { sections: Vec::new() } }
}

impl HomePage {
    pub const RECOMMENDED: &'static str = "recommended";
    pub const RECENT: &'static str = "recent";

    pub fn is_empty(&self) -> bool {
        match self {
            HomePage::Featured { recommended, recent } => recommended.is_empty() && recent.is_empty(),
            HomePage::Sections { sections } => sections.iter().all(|s| s.items.is_empty()),
        }
    }

    /// Flatten either shape into ordered sections. Empty featured lists are skipped.
    pub fn into_sections(self) -> Vec<HomeSection> {
        match self {
            HomePage::Sections { sections } => sections,
            HomePage::Featured { recommended, recent } => [(Self::RECOMMENDED, recommended), (Self::RECENT, recent)]
                .into_iter()
                .filter(|(_, items)| !items.is_empty())
                .map(|(title, items)| HomeSection { title: title.to_string(), items })
                .collect(),
        }
    }
}
