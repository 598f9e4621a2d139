//! Browse session scope.
//!
//! A [`BrowseContext`] is created by whatever owns the views and holds every
//! component of one browsing session. There are no global instances; two
//! contexts never share state.

use std::sync::Arc;

use tracing::info;

use crate::address::BrowseAddress;
use crate::config::Config;
use crate::detail::DetailView;
use crate::feed::CatalogFeedManager;
use crate::gateway::{CatalogError, CatalogGateway, JikanClient};
use crate::search::SearchOrchestrator;

/// Feed manager, search orchestrator and detail views of one session.
///
/// Must be created within a Tokio runtime. Dropping the context (or calling
/// [`shutdown`](Self::shutdown)) cancels everything in flight.
pub struct BrowseContext {
    gateway: Arc<dyn CatalogGateway>,
    feed: CatalogFeedManager,
    search: SearchOrchestrator,
}

impl BrowseContext {
    pub fn new(gateway: Arc<dyn CatalogGateway>, config: &Config) -> Self {
        Self::with_address(gateway, config, BrowseAddress::home())
    }

    /// Start from an address restored from a query string.
    pub fn with_address(
        gateway: Arc<dyn CatalogGateway>,
        config: &Config,
        address: BrowseAddress,
    ) -> Self {
        let feed = CatalogFeedManager::with_address(
            Arc::clone(&gateway),
            config.feed.clone(),
            address,
        );
        let search = SearchOrchestrator::new(Arc::clone(&gateway), &config.search, feed.clone());

        info!(base_url = %config.gateway.base_url, "Browse context created");

        Self {
            gateway,
            feed,
            search,
        }
    }

    /// Build a context talking to the catalog configured in `config`.
    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        let client = JikanClient::new(&config.gateway)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn feed(&self) -> &CatalogFeedManager {
        &self.feed
    }

    pub fn search(&self) -> &SearchOrchestrator {
        &self.search
    }

    /// Create a detail view sharing this session's gateway.
    pub fn detail_view(&self) -> DetailView {
        DetailView::new(Arc::clone(&self.gateway))
    }

    /// Stop the search debouncer and cancel all feed requests.
    pub fn shutdown(&self) {
        self.search.shutdown();
        self.feed.leave();
        info!("Browse context shut down");
    }
}

impl std::fmt::Debug for BrowseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowseContext")
            .field("feed", &self.feed)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl Drop for BrowseContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
