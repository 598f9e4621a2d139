//! Mock catalog gateway for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::gateway::{
    CatalogError, CatalogGateway, CatalogItem, CatalogPage, PageInfo, RelationGroup,
    SearchCriteria,
};

/// Gateway operations, for per-endpoint latency, gates and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockEndpoint {
    Search,
    Recent,
    TopAiring,
    SeasonHighlight,
    Detail,
    Relations,
}

/// A recorded gateway call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCatalogQuery {
    Search {
        criteria: SearchCriteria,
        page: u32,
        page_size: u32,
    },
    ListByRecency {
        page: u32,
        page_size: u32,
    },
    ListTopAiring {
        limit: u32,
    },
    ListCurrentSeasonHighlight {
        limit: u32,
    },
    GetById {
        id: u32,
    },
    GetRelations {
        id: u32,
    },
}

impl RecordedCatalogQuery {
    pub fn endpoint(&self) -> MockEndpoint {
        match self {
            Self::Search { .. } => MockEndpoint::Search,
            Self::ListByRecency { .. } => MockEndpoint::Recent,
            Self::ListTopAiring { .. } => MockEndpoint::TopAiring,
            Self::ListCurrentSeasonHighlight { .. } => MockEndpoint::SeasonHighlight,
            Self::GetById { .. } => MockEndpoint::Detail,
            Self::GetRelations { .. } => MockEndpoint::Relations,
        }
    }
}

/// Mock implementation of the CatalogGateway trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable catalog entries per endpoint
/// - Track calls and their cancellation tokens for assertions
/// - Delay responses per endpoint or per search text
/// - Hold responses behind gates until released
/// - Simulate failures
///
/// Delays use `tokio::time`, so paused-time tests advance them instantly.
#[derive(Debug)]
pub struct MockCatalogGateway {
    /// Entries served by search and detail lookups.
    items: Arc<RwLock<Vec<CatalogItem>>>,
    /// Entries served by the recency listing, newest first.
    recent: Arc<RwLock<Vec<CatalogItem>>>,
    /// Entries served by the top-airing listing.
    top_airing: Arc<RwLock<Vec<CatalogItem>>>,
    /// Entries served by the season highlight listing.
    season: Arc<RwLock<Vec<CatalogItem>>>,
    /// Relation groups by entry ID.
    relations: Arc<RwLock<HashMap<u32, Vec<RelationGroup>>>>,
    /// Recorded calls with the token each one received.
    calls: Arc<RwLock<Vec<(RecordedCatalogQuery, CancellationToken)>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
    /// Endpoints failing on every call, with the failure message.
    endpoint_errors: Arc<RwLock<HashMap<MockEndpoint, String>>>,
    delays: Arc<RwLock<HashMap<MockEndpoint, Duration>>>,
    /// Search delays by text, overriding the endpoint delay.
    search_delays: Arc<RwLock<HashMap<String, Duration>>>,
    /// Closed gates hold calls until released.
    gates: Arc<RwLock<HashMap<MockEndpoint, watch::Sender<bool>>>>,
}

impl Default for MockCatalogGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalogGateway {
    /// Create a new empty mock gateway.
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
            recent: Arc::new(RwLock::new(Vec::new())),
            top_airing: Arc::new(RwLock::new(Vec::new())),
            season: Arc::new(RwLock::new(Vec::new())),
            relations: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            endpoint_errors: Arc::new(RwLock::new(HashMap::new())),
            delays: Arc::new(RwLock::new(HashMap::new())),
            search_delays: Arc::new(RwLock::new(HashMap::new())),
            gates: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    // =========================================================================
    // Catalog Content
    // =========================================================================

    /// Set the entries served by search and detail lookups.
    pub async fn set_items(&self, items: Vec<CatalogItem>) {
        *self.items.write().await = items;
    }

    /// Add one entry for search and detail lookups.
    pub async fn add_item(&self, item: CatalogItem) {
        self.items.write().await.push(item);
    }

    /// Set the recency listing, newest first.
    pub async fn set_recent(&self, items: Vec<CatalogItem>) {
        *self.recent.write().await = items;
    }

    /// Set the top-airing listing.
    pub async fn set_top_airing(&self, items: Vec<CatalogItem>) {
        *self.top_airing.write().await = items;
    }

    /// Set the season highlight listing.
    pub async fn set_season(&self, items: Vec<CatalogItem>) {
        *self.season.write().await = items;
    }

    /// Set the relation groups of an entry.
    pub async fn set_relations(&self, id: u32, groups: Vec<RelationGroup>) {
        self.relations.write().await.insert(id, groups);
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded queries, in call order.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.calls
            .read()
            .await
            .iter()
            .map(|(query, _)| query.clone())
            .collect()
    }

    /// Get recorded queries for one endpoint, in call order.
    pub async fn queries_for(&self, endpoint: MockEndpoint) -> Vec<RecordedCatalogQuery> {
        self.recorded_queries()
            .await
            .into_iter()
            .filter(|query| query.endpoint() == endpoint)
            .collect()
    }

    /// Get recorded queries whose cancellation token has fired.
    pub async fn cancelled_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|(_, token)| token.is_cancelled())
            .map(|(query, _)| query.clone())
            .collect()
    }

    /// Clear recorded queries.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    /// Get the number of calls performed.
    pub async fn query_count(&self) -> usize {
        self.calls.read().await.len()
    }

    // =========================================================================
    // Latency
    // =========================================================================

    /// Delay every response of an endpoint.
    pub async fn set_delay(&self, endpoint: MockEndpoint, delay: Duration) {
        self.delays.write().await.insert(endpoint, delay);
    }

    /// Delay searches for one exact text.
    pub async fn set_search_delay(&self, text: &str, delay: Duration) {
        self.search_delays
            .write()
            .await
            .insert(text.to_string(), delay);
    }

    /// Hold calls to an endpoint until [`release`](Self::release) is called.
    pub async fn hold(&self, endpoint: MockEndpoint) {
        let mut gates = self.gates.write().await;
        match gates.get(&endpoint) {
            Some(gate) => {
                gate.send_replace(false);
            }
            None => {
                gates.insert(endpoint, watch::channel(false).0);
            }
        }
    }

    /// Let held calls to an endpoint proceed.
    pub async fn release(&self, endpoint: MockEndpoint) {
        if let Some(gate) = self.gates.read().await.get(&endpoint) {
            gate.send_replace(true);
        }
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Make every call to an endpoint fail with a server error.
    pub async fn fail_endpoint(&self, endpoint: MockEndpoint, message: &str) {
        self.endpoint_errors
            .write()
            .await
            .insert(endpoint, message.to_string());
    }

    /// Stop failing calls to an endpoint.
    pub async fn clear_endpoint_error(&self, endpoint: MockEndpoint) {
        self.endpoint_errors.write().await.remove(&endpoint);
    }

    /// Record a call, wait out its latency, then apply error injection.
    async fn begin(
        &self,
        query: RecordedCatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<(), CatalogError> {
        let endpoint = query.endpoint();

        let search_delay = match &query {
            RecordedCatalogQuery::Search {
                criteria: SearchCriteria::Text(text),
                ..
            } => self.search_delays.read().await.get(text).copied(),
            _ => None,
        };
        let delay = match search_delay {
            Some(delay) => delay,
            None => self
                .delays
                .read()
                .await
                .get(&endpoint)
                .copied()
                .unwrap_or_default(),
        };
        let gate = self.gates.read().await.get(&endpoint).map(watch::Sender::subscribe);

        self.calls.write().await.push((query, cancel.clone()));

        let ready = async move {
            if let Some(mut gate) = gate {
                let _ = gate.wait_for(|open| *open).await;
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
            _ = ready => {}
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if let Some(message) = self.endpoint_errors.read().await.get(&endpoint) {
            return Err(CatalogError::ApiError {
                status: 500,
                message: message.clone(),
            });
        }

        Ok(())
    }
}

fn paginate(items: Vec<CatalogItem>, page: u32, page_size: u32) -> CatalogPage {
    let page = page.max(1);
    let size = page_size.max(1) as usize;
    let last_page = items.len().div_ceil(size).max(1) as u32;

    CatalogPage {
        items: items
            .into_iter()
            .skip((page as usize - 1) * size)
            .take(size)
            .collect(),
        page: Some(PageInfo::new(page, last_page)),
    }
}

fn matches_criteria(item: &CatalogItem, criteria: &SearchCriteria) -> bool {
    match criteria {
        SearchCriteria::Text(text) => {
            let text = text.to_lowercase();
            item.title.to_lowercase().contains(&text)
                || item
                    .title_english
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&text))
        }
        SearchCriteria::Prefix(letter) => item
            .title
            .chars()
            .next()
            .is_some_and(|first| first.to_lowercase().eq(letter.to_lowercase())),
    }
}

#[async_trait]
impl CatalogGateway for MockCatalogGateway {
    async fn search(
        &self,
        criteria: &SearchCriteria,
        page: u32,
        page_size: u32,
        cancel: CancellationToken,
    ) -> Result<CatalogPage, CatalogError> {
        self.begin(
            RecordedCatalogQuery::Search {
                criteria: criteria.clone(),
                page,
                page_size,
            },
            &cancel,
        )
        .await?;

        let matching: Vec<CatalogItem> = self
            .items
            .read()
            .await
            .iter()
            .filter(|item| matches_criteria(item, criteria))
            .cloned()
            .collect();

        Ok(paginate(matching, page, page_size))
    }

    async fn list_by_recency(
        &self,
        page: u32,
        page_size: u32,
        cancel: CancellationToken,
    ) -> Result<CatalogPage, CatalogError> {
        self.begin(
            RecordedCatalogQuery::ListByRecency { page, page_size },
            &cancel,
        )
        .await?;

        let recent = self.recent.read().await.clone();
        Ok(paginate(recent, page, page_size))
    }

    async fn list_top_airing(
        &self,
        limit: u32,
        cancel: CancellationToken,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        self.begin(RecordedCatalogQuery::ListTopAiring { limit }, &cancel)
            .await?;

        Ok(self
            .top_airing
            .read()
            .await
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_current_season_highlight(
        &self,
        limit: u32,
        cancel: CancellationToken,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        self.begin(
            RecordedCatalogQuery::ListCurrentSeasonHighlight { limit },
            &cancel,
        )
        .await?;

        Ok(self
            .season
            .read()
            .await
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_by_id(
        &self,
        id: u32,
        cancel: CancellationToken,
    ) -> Result<CatalogItem, CatalogError> {
        self.begin(RecordedCatalogQuery::GetById { id }, &cancel)
            .await?;

        let found = self.items.read().await.iter().find(|i| i.id == id).cloned();
        match found {
            Some(item) => Ok(item),
            None => self
                .recent
                .read()
                .await
                .iter()
                .find(|i| i.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(format!("Anime {} not found", id))),
        }
    }

    async fn get_relations(
        &self,
        id: u32,
        cancel: CancellationToken,
    ) -> Result<Vec<RelationGroup>, CatalogError> {
        self.begin(RecordedCatalogQuery::GetRelations { id }, &cancel)
            .await?;

        Ok(self
            .relations
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_search_text_and_prefix() {
        let gateway = MockCatalogGateway::new();
        gateway
            .set_items(fixtures::catalog_items(&["Naruto", "Bleach", "Nana"]))
            .await;

        let page = gateway
            .search(
                &SearchCriteria::Text("aru".to_string()),
                1,
                5,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Naruto");

        let page = gateway
            .search(&SearchCriteria::Prefix('n'), 1, 5, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_recency_is_paginated() {
        let gateway = MockCatalogGateway::new();
        let titles: Vec<String> = (1..=30).map(|i| format!("Show {}", i)).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        gateway.set_recent(fixtures::catalog_items(&refs)).await;

        let page = gateway
            .list_by_recency(2, 25, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.page, Some(PageInfo::new(2, 2)));
    }

    #[tokio::test]
    async fn test_recorded_queries() {
        let gateway = MockCatalogGateway::new();

        gateway.list_top_airing(5, CancellationToken::new()).await.ok();
        gateway
            .list_current_season_highlight(1, CancellationToken::new())
            .await
            .ok();

        let queries = gateway.recorded_queries().await;
        assert_eq!(
            queries,
            vec![
                RecordedCatalogQuery::ListTopAiring { limit: 5 },
                RecordedCatalogQuery::ListCurrentSeasonHighlight { limit: 1 },
            ]
        );
        assert_eq!(gateway.queries_for(MockEndpoint::TopAiring).await.len(), 1);
    }

    #[tokio::test]
    async fn test_error_injection() {
        let gateway = MockCatalogGateway::new();
        gateway.set_next_error(CatalogError::RateLimitExceeded).await;

        let result = gateway.get_relations(1, CancellationToken::new()).await;
        assert!(matches!(result, Err(CatalogError::RateLimitExceeded)));

        // Error should be consumed
        let result = gateway.get_relations(1, CancellationToken::new()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_endpoint_failure_persists() {
        let gateway = MockCatalogGateway::new();
        gateway.fail_endpoint(MockEndpoint::Relations, "boom").await;

        for _ in 0..2 {
            let result = gateway.get_relations(1, CancellationToken::new()).await;
            assert!(matches!(result, Err(CatalogError::ApiError { status: 500, .. })));
        }

        gateway.clear_endpoint_error(MockEndpoint::Relations).await;
        assert!(gateway.get_relations(1, CancellationToken::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_not_found() {
        let gateway = MockCatalogGateway::new();
        let result = gateway.get_by_id(404, CancellationToken::new()).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_delay() {
        let gateway = Arc::new(MockCatalogGateway::new());
        gateway
            .set_delay(MockEndpoint::Detail, Duration::from_secs(10))
            .await;

        let token = CancellationToken::new();
        let call = {
            let gateway = Arc::clone(&gateway);
            let token = token.clone();
            tokio::spawn(async move { gateway.get_by_id(1, token).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        let result = call.await.unwrap();
        assert!(matches!(result, Err(CatalogError::Cancelled)));
        assert_eq!(gateway.cancelled_queries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_gate_holds_until_released() {
        let gateway = Arc::new(MockCatalogGateway::new());
        gateway.hold(MockEndpoint::TopAiring).await;

        let call = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.list_top_airing(5, CancellationToken::new()).await })
        };

        tokio::task::yield_now().await;
        assert!(!call.is_finished());

        gateway.release(MockEndpoint::TopAiring).await;
        assert!(call.await.unwrap().is_ok());
    }
}
