//! Domain types for catalog entries.

use serde::{Deserialize, Serialize};

/// One anime entry.
///
/// Identity is `id`; the same entry may live in several slots at once, each
/// holding its own copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    /// Catalog ID (MyAnimeList ID, always >= 1).
    pub id: u32,
    /// Primary (romanized) title.
    pub title: String,
    /// English title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_english: Option<String>,
    /// Native (Japanese) title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_japanese: Option<String>,
    /// Cover images.
    pub images: ImageSet,
    /// Average score (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Number of users that scored the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scored_by: Option<u32>,
    /// Score rank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    /// Popularity rank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
    /// Episode count, unknown while airing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<u32>,
    /// Airing status ("Currently Airing", "Finished Airing", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Whether the entry is airing right now.
    #[serde(default)]
    pub airing: bool,
    /// Media type (TV, Movie, OVA, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Human readable airing range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aired: Option<String>,
    /// Season name (winter, spring, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    /// Season year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Audience rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    /// Episode duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Synopsis, empty when upstream has none.
    #[serde(default)]
    pub synopsis: String,
    /// Genres in upstream order.
    #[serde(default)]
    pub genres: Vec<Tag>,
    /// Trailer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer: Option<Trailer>,
}

impl CatalogItem {
    /// Title to show in prominent places: English when present, else primary.
    pub fn display_title(&self) -> &str {
        self.title_english
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }

    /// Season label such as "spring 2024".
    pub fn season_label(&self) -> Option<String> {
        match (&self.season, self.year) {
            (Some(season), Some(year)) => Some(format!("{} {}", season, year)),
            (Some(season), None) => Some(season.clone()),
            (None, Some(year)) => Some(year.to_string()),
            (None, None) => None,
        }
    }
}

/// Image variants in one format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageVariants {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
}

impl ImageVariants {
    fn first(&self) -> Option<&str> {
        self.regular
            .as_deref()
            .or(self.large.as_deref())
            .or(self.small.as_deref())
    }
}

/// Cover images in the formats the catalog serves.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageSet {
    #[serde(default)]
    pub jpg: ImageVariants,
    #[serde(default)]
    pub webp: ImageVariants,
}

impl ImageSet {
    /// Small thumbnail, falling back to any available size.
    pub fn thumbnail(&self) -> Option<&str> {
        self.jpg
            .small
            .as_deref()
            .or(self.webp.small.as_deref())
            .or_else(|| self.any())
    }

    /// Large poster, falling back to any available size.
    pub fn poster(&self) -> Option<&str> {
        self.jpg
            .large
            .as_deref()
            .or(self.webp.large.as_deref())
            .or_else(|| self.any())
    }

    fn any(&self) -> Option<&str> {
        self.jpg.first().or_else(|| self.webp.first())
    }
}

/// A taxonomy entry (genre, theme, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: u32,
    pub name: String,
}

/// Trailer reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trailer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
}

/// Pagination info returned alongside list responses.
///
/// Accepted values always satisfy `current_page <= last_page` and
/// `has_next == (current_page < last_page)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u32,
    pub last_page: u32,
    pub has_next: bool,
}

impl PageInfo {
    /// Build a page info, repairing inconsistent upstream values.
    pub fn new(current_page: u32, last_page: u32) -> Self {
        let current_page = current_page.max(1);
        let last_page = last_page.max(current_page);
        Self {
            current_page,
            last_page,
            has_next: current_page < last_page,
        }
    }

    /// Page before this one, if any.
    pub fn previous_page(&self) -> Option<u32> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    /// Page after this one, if any.
    pub fn next_page(&self) -> Option<u32> {
        self.has_next.then(|| self.current_page + 1)
    }

    /// Pagination controls are only worth showing with more than one page.
    pub fn shows_controls(&self) -> bool {
        self.last_page > 1
    }
}

/// A page of catalog entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
}

impl CatalogPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Entries sharing one relation kind ("Sequel", "Adaptation", ...).
///
/// Relation kinds are not unique within a response; order is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationGroup {
    pub relation: String,
    pub entries: Vec<RelatedEntry>,
}

/// One related entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelatedEntry {
    pub id: u32,
    pub name: String,
    /// Entry kind ("anime", "manga").
    pub kind: String,
}
