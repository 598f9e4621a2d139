//! Remote catalog gateway.
//!
//! This module defines the read-only contract the engine uses to talk to the
//! remote anime catalog, plus the Jikan-backed implementation of it.
//! Every call takes a [`CancellationToken`]; cancelling it aborts the request
//! and surfaces as [`CatalogError::Cancelled`].

mod jikan;
mod types;

pub use jikan::JikanClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur when talking to the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (bad base URL, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// The request was cancelled by its owner.
    #[error("Request cancelled")]
    Cancelled,
}

impl CatalogError {
    /// Whether this outcome is an explicit cancellation rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Search criteria for [`CatalogGateway::search`].
///
/// Exactly one of free text or a prefix letter is sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Full-text query.
    Text(String),
    /// Titles starting with the given letter.
    Prefix(char),
}

/// Read-only operations against the remote catalog.
///
/// Adult content is always filtered server-side; implementations send the
/// filter flag unconditionally.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Search the catalog by text or prefix letter.
    async fn search(
        &self,
        criteria: &SearchCriteria,
        page: u32,
        page_size: u32,
        cancel: CancellationToken,
    ) -> Result<CatalogPage, CatalogError>;

    /// List entries ordered by start date, newest first.
    async fn list_by_recency(
        &self,
        page: u32,
        page_size: u32,
        cancel: CancellationToken,
    ) -> Result<CatalogPage, CatalogError>;

    /// List the top currently-airing entries.
    async fn list_top_airing(
        &self,
        limit: u32,
        cancel: CancellationToken,
    ) -> Result<Vec<CatalogItem>, CatalogError>;

    /// List highlights of the current season.
    async fn list_current_season_highlight(
        &self,
        limit: u32,
        cancel: CancellationToken,
    ) -> Result<Vec<CatalogItem>, CatalogError>;

    /// Fetch a single entry with full details.
    async fn get_by_id(&self, id: u32, cancel: CancellationToken)
        -> Result<CatalogItem, CatalogError>;

    /// Fetch the relation groups of an entry.
    async fn get_relations(
        &self,
        id: u32,
        cancel: CancellationToken,
    ) -> Result<Vec<RelationGroup>, CatalogError>;
}
