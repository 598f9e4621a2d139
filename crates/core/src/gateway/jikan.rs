//! Jikan (unofficial MyAnimeList) API client.
//!
//! Jikan needs no API key but enforces a low request rate (3/s); callers are
//! expected to cancel superseded requests instead of piling them up.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::{
    CatalogItem, CatalogPage, ImageSet, ImageVariants, PageInfo, RelatedEntry, RelationGroup, Tag,
    Trailer,
};
use super::{CatalogError, CatalogGateway, SearchCriteria};
use crate::config::GatewayConfig;
use crate::metrics;

/// Adult content is always filtered out; not configurable.
const SFW: (&str, &str) = ("sfw", "true");

/// Jikan API client.
pub struct JikanClient {
    client: Client,
    base_url: String,
}

impl JikanClient {
    /// Create a new Jikan client.
    pub fn new(config: &GatewayConfig) -> Result<Self, CatalogError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(CatalogError::NotConfigured(
                "Jikan base URL is required".to_string(),
            ));
        }

        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let client = builder.build()?;

        Ok(Self { client, base_url })
    }

    /// GET `path` with `query`, aborting as soon as `cancel` fires.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<T, CatalogError> {
        metrics::GATEWAY_REQUESTS
            .with_label_values(&[endpoint])
            .inc();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(endpoint, path, "Jikan request cancelled");
                Err(CatalogError::Cancelled)
            }
            result = self.fetch_json(path, query) => result,
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.base_url, path);

        debug!("Jikan request: url='{}', query={:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[SFW])
            .send()
            .await?;

        let status = response.status();
        if status == 404 {
            return Err(CatalogError::NotFound(path.to_string()));
        }
        if status == 429 {
            return Err(CatalogError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse {} response: {}", path, e))
        })
    }

    async fn get_list(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<CatalogPage, CatalogError> {
        let response: JikanList<JikanAnime> =
            self.get_json(endpoint, path, query, cancel).await?;
        Ok(response.into())
    }
}

#[async_trait]
impl CatalogGateway for JikanClient {
    async fn search(
        &self,
        criteria: &SearchCriteria,
        page: u32,
        page_size: u32,
        cancel: CancellationToken,
    ) -> Result<CatalogPage, CatalogError> {
        let mut query = vec![("page", page.to_string()), ("limit", page_size.to_string())];
        match criteria {
            SearchCriteria::Text(text) => query.push(("q", text.clone())),
            SearchCriteria::Prefix(letter) => query.push(("letter", letter.to_string())),
        }

        self.get_list("search", "anime", &query, &cancel).await
    }

    async fn list_by_recency(
        &self,
        page: u32,
        page_size: u32,
        cancel: CancellationToken,
    ) -> Result<CatalogPage, CatalogError> {
        let query = [
            ("page", page.to_string()),
            ("limit", page_size.to_string()),
            ("order_by", "start_date".to_string()),
            ("sort", "desc".to_string()),
        ];

        self.get_list("recent", "anime", &query, &cancel).await
    }

    async fn list_top_airing(
        &self,
        limit: u32,
        cancel: CancellationToken,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let query = [("filter", "airing".to_string()), ("limit", limit.to_string())];

        let page = self.get_list("top", "top/anime", &query, &cancel).await?;
        Ok(page.items)
    }

    async fn list_current_season_highlight(
        &self,
        limit: u32,
        cancel: CancellationToken,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let query = [("limit", limit.to_string())];

        let page = self
            .get_list("season", "seasons/now", &query, &cancel)
            .await?;
        Ok(page.items)
    }

    async fn get_by_id(
        &self,
        id: u32,
        cancel: CancellationToken,
    ) -> Result<CatalogItem, CatalogError> {
        let path = format!("anime/{}/full", id);

        let response: JikanSingle<JikanAnime> =
            self.get_json("detail", &path, &[], &cancel).await?;
        Ok(response.data.into())
    }

    async fn get_relations(
        &self,
        id: u32,
        cancel: CancellationToken,
    ) -> Result<Vec<RelationGroup>, CatalogError> {
        let path = format!("anime/{}/relations", id);

        let response: JikanSingle<Vec<JikanRelation>> =
            self.get_json("relations", &path, &[], &cancel).await?;
        Ok(response.data.into_iter().map(|r| r.into()).collect())
    }
}

// ============================================================================
// Jikan API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct JikanList<T> {
    data: Vec<T>,
    pagination: Option<JikanPagination>,
}

#[derive(Debug, Deserialize)]
struct JikanSingle<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct JikanPagination {
    last_visible_page: u32,
    current_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct JikanAnime {
    mal_id: u32,
    title: String,
    title_english: Option<String>,
    title_japanese: Option<String>,
    #[serde(default)]
    images: JikanImages,
    trailer: Option<JikanTrailer>,
    #[serde(rename = "type")]
    media_type: Option<String>,
    episodes: Option<u32>,
    status: Option<String>,
    #[serde(default)]
    airing: bool,
    aired: Option<JikanAired>,
    duration: Option<String>,
    rating: Option<String>,
    score: Option<f32>,
    scored_by: Option<u32>,
    rank: Option<u32>,
    popularity: Option<u32>,
    synopsis: Option<String>,
    season: Option<String>,
    year: Option<u32>,
    #[serde(default)]
    genres: Vec<JikanResource>,
}

#[derive(Debug, Default, Deserialize)]
struct JikanImages {
    #[serde(default)]
    jpg: JikanImageUrls,
    #[serde(default)]
    webp: JikanImageUrls,
}

#[derive(Debug, Default, Deserialize)]
struct JikanImageUrls {
    image_url: Option<String>,
    small_image_url: Option<String>,
    large_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JikanTrailer {
    youtube_id: Option<String>,
    url: Option<String>,
    embed_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JikanAired {
    string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JikanResource {
    mal_id: u32,
    #[serde(rename = "type")]
    kind: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct JikanRelation {
    relation: String,
    #[serde(default)]
    entry: Vec<JikanResource>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<JikanList<JikanAnime>> for CatalogPage {
    fn from(list: JikanList<JikanAnime>) -> Self {
        Self {
            items: list.data.into_iter().map(|a| a.into()).collect(),
            page: list
                .pagination
                .map(|p| PageInfo::new(p.current_page.unwrap_or(1), p.last_visible_page)),
        }
    }
}

impl From<JikanAnime> for CatalogItem {
    fn from(a: JikanAnime) -> Self {
        let trailer = a
            .trailer
            .map(Trailer::from)
            .filter(|t| t.youtube_id.is_some() || t.url.is_some() || t.embed_url.is_some());

        Self {
            id: a.mal_id,
            title: a.title,
            title_english: a.title_english,
            title_japanese: a.title_japanese,
            images: a.images.into(),
            score: a.score,
            scored_by: a.scored_by,
            rank: a.rank,
            popularity: a.popularity,
            episodes: a.episodes,
            status: a.status,
            airing: a.airing,
            media_type: a.media_type,
            aired: a.aired.and_then(|aired| aired.string),
            season: a.season,
            year: a.year,
            rating: a.rating,
            duration: a.duration,
            synopsis: a.synopsis.unwrap_or_default(),
            genres: a
                .genres
                .into_iter()
                .map(|g| Tag {
                    id: g.mal_id,
                    name: g.name,
                })
                .collect(),
            trailer,
        }
    }
}

impl From<JikanImages> for ImageSet {
    fn from(i: JikanImages) -> Self {
        Self {
            jpg: i.jpg.into(),
            webp: i.webp.into(),
        }
    }
}

impl From<JikanImageUrls> for ImageVariants {
    fn from(u: JikanImageUrls) -> Self {
        Self {
            small: u.small_image_url,
            regular: u.image_url,
            large: u.large_image_url,
        }
    }
}

impl From<JikanTrailer> for Trailer {
    fn from(t: JikanTrailer) -> Self {
        Self {
            youtube_id: t.youtube_id,
            url: t.url,
            embed_url: t.embed_url,
        }
    }
}

impl From<JikanRelation> for RelationGroup {
    fn from(r: JikanRelation) -> Self {
        Self {
            relation: r.relation,
            entries: r
                .entry
                .into_iter()
                .map(|e| RelatedEntry {
                    id: e.mal_id,
                    name: e.name,
                    kind: e.kind.unwrap_or_default(),
                })
                .collect(),
        }
    }
}
