use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::address::BrowseAddress;
use crate::config::FeedConfig;
use crate::dedup::dedup_by_title;
use crate::gateway::{CatalogGateway, CatalogPage, SearchCriteria};
use crate::search::{SearchTier, ValidationRejection};
use crate::slot::{SlotSnapshot, TaskSlot};

use super::types::{Highlights, ResultsView};

struct FeedState {
    /// Whether the main view is mounted; triggers are ignored otherwise.
    entered: bool,
    /// Set when the committed query was refused without a request.
    rejection: Option<ValidationRejection>,
}

struct FeedInner {
    gateway: Arc<dyn CatalogGateway>,
    config: FeedConfig,
    highlights: TaskSlot<Highlights>,
    search: TaskSlot<CatalogPage>,
    newest: TaskSlot<CatalogPage>,
    address: watch::Sender<BrowseAddress>,
    state: Mutex<FeedState>,
}

impl FeedInner {
    // Lock order: feed state, then slot state. Slots never call back here.
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn submit_highlights(&self) {
        let gateway = Arc::clone(&self.gateway);
        let top_limit = self.config.top_limit;
        let highlight_limit = self.config.highlight_limit;

        self.highlights.submit(move |cancel| async move {
            let (top, season) = tokio::try_join!(
                gateway.list_top_airing(top_limit, cancel.clone()),
                gateway.list_current_season_highlight(highlight_limit, cancel),
            )?;

            Ok(Highlights {
                top: top.into_iter().take(top_limit as usize).collect(),
                banner: season.into_iter().next(),
            })
        });
    }

    fn submit_search(&self, criteria: SearchCriteria, page: u32) {
        let gateway = Arc::clone(&self.gateway);
        let page_size = self.config.results_page_size;

        self.search.submit(move |cancel| async move {
            gateway.search(&criteria, page, page_size, cancel).await
        });
    }

    fn submit_newest(&self, page: u32) {
        let gateway = Arc::clone(&self.gateway);
        let page_size = self.config.newest_page_size;
        let limit = self.config.newest_display_limit;

        self.newest.submit(move |cancel| async move {
            let fetched = gateway.list_by_recency(page, page_size, cancel).await?;
            // Pagination info describes the upstream page, not the deduplicated one.
            Ok(CatalogPage {
                items: dedup_by_title(fetched.items, limit),
                page: fetched.page,
            })
        });
    }

    /// (Re)start the slot the address selects and clear the other one.
    fn trigger_active(&self, state: &mut FeedState, address: &BrowseAddress) {
        let page = address.page();

        let Some(query) = address.query() else {
            state.rejection = None;
            self.search.reset();
            debug!(page, "Loading newest releases");
            self.submit_newest(page);
            return;
        };

        self.newest.reset();
        let tier = SearchTier::classify(query);
        match tier.criteria() {
            Some(criteria) => {
                state.rejection = None;
                debug!(query, page, tier = tier.as_str(), "Loading search results");
                self.submit_search(criteria, page);
            }
            None => {
                self.search.reset();
                state.rejection = tier.validate_commit().err();
                debug!(query, tier = tier.as_str(), "Committed query rejected");
            }
        }
    }
}

/// Owner of the main view's feeds.
///
/// Cheap to clone; clones share the same slots. Triggers only start requests
/// between [`enter`](Self::enter) and [`leave`](Self::leave); address changes
/// made outside that window are applied on the next `enter`.
#[derive(Clone)]
pub struct CatalogFeedManager {
    inner: Arc<FeedInner>,
}

impl CatalogFeedManager {
    pub fn new(gateway: Arc<dyn CatalogGateway>, config: FeedConfig) -> Self {
        Self::with_address(gateway, config, BrowseAddress::home())
    }

    /// Start from an address restored from a query string.
    pub fn with_address(
        gateway: Arc<dyn CatalogGateway>,
        config: FeedConfig,
        address: BrowseAddress,
    ) -> Self {
        let (address, _) = watch::channel(address);

        Self {
            inner: Arc::new(FeedInner {
                gateway,
                config,
                highlights: TaskSlot::new("highlights"),
                search: TaskSlot::new("committed_search"),
                newest: TaskSlot::new("newest"),
                address,
                state: Mutex::new(FeedState {
                    entered: false,
                    rejection: None,
                }),
            }),
        }
    }

    // =========================================================================
    // Triggers
    // =========================================================================

    /// The main view was mounted: load the highlights and the active slot.
    pub fn enter(&self) {
        let mut state = self.inner.lock();
        if state.entered {
            return;
        }
        state.entered = true;

        let address = self.inner.address.borrow().clone();
        info!(address = %address, "Entering catalog feeds");

        self.inner.submit_highlights();
        self.inner.trigger_active(&mut state, &address);
    }

    /// The main view was unmounted: cancel everything in flight.
    ///
    /// Slot contents are kept for the next `enter`.
    pub fn leave(&self) {
        let mut state = self.inner.lock();
        if !state.entered {
            return;
        }
        state.entered = false;

        self.inner.highlights.cancel_in_flight();
        self.inner.search.cancel_in_flight();
        self.inner.newest.cancel_in_flight();
        info!("Left catalog feeds");
    }

    /// Apply an externally changed address.
    ///
    /// Navigating to the current address does nothing.
    pub fn navigate(&self, address: BrowseAddress) {
        self.apply(address, false);
    }

    /// Move to another page of whatever the active slot shows.
    pub fn set_page(&self, page: u32) {
        let address = self.inner.address.borrow().with_page(page);
        self.apply(address, false);
    }

    /// Make `query` the committed query, starting at page 1.
    ///
    /// Always re-triggers the search, even for the current query.
    pub fn commit(&self, query: &str) {
        self.apply(BrowseAddress::search(query), true);
    }

    /// Re-run the active slot for the current address.
    pub fn refresh(&self) {
        let mut state = self.inner.lock();
        if state.entered {
            let address = self.inner.address.borrow().clone();
            self.inner.trigger_active(&mut state, &address);
        }
    }

    fn apply(&self, address: BrowseAddress, force: bool) {
        let mut state = self.inner.lock();

        let changed = self.inner.address.send_if_modified(|current| {
            if *current == address {
                false
            } else {
                *current = address.clone();
                true
            }
        });

        if !changed && !force {
            debug!(address = %address, "Address unchanged");
            return;
        }
        info!(address = %address, "Browse address changed");

        if state.entered {
            self.inner.trigger_active(&mut state, &address);
        }
    }

    // =========================================================================
    // Projections
    // =========================================================================

    pub fn address(&self) -> BrowseAddress {
        self.inner.address.borrow().clone()
    }

    /// Subscribe to address changes, e.g. to mirror them into a URL bar.
    pub fn subscribe_address(&self) -> watch::Receiver<BrowseAddress> {
        self.inner.address.subscribe()
    }

    pub fn is_entered(&self) -> bool {
        self.inner.lock().entered
    }

    pub fn rejection(&self) -> Option<ValidationRejection> {
        self.inner.lock().rejection
    }

    pub fn highlights(&self) -> SlotSnapshot<Highlights> {
        self.inner.highlights.snapshot()
    }

    pub fn subscribe_highlights(&self) -> watch::Receiver<SlotSnapshot<Highlights>> {
        self.inner.highlights.subscribe()
    }

    pub fn search_results(&self) -> SlotSnapshot<CatalogPage> {
        self.inner.search.snapshot()
    }

    pub fn subscribe_search_results(&self) -> watch::Receiver<SlotSnapshot<CatalogPage>> {
        self.inner.search.subscribe()
    }

    pub fn newest(&self) -> SlotSnapshot<CatalogPage> {
        self.inner.newest.snapshot()
    }

    pub fn subscribe_newest(&self) -> watch::Receiver<SlotSnapshot<CatalogPage>> {
        self.inner.newest.subscribe()
    }

    /// Project the state for the main results panel.
    pub fn results_view(&self) -> ResultsView {
        let state = self.inner.lock();
        let address = self.inner.address.borrow().clone();

        match address.query() {
            None => ResultsView::Newest(self.inner.newest.snapshot()),
            Some(query) => match state.rejection {
                Some(rejection) => ResultsView::Rejected {
                    query: query.to_string(),
                    rejection,
                },
                None => ResultsView::Search {
                    query: query.to_string(),
                    results: self.inner.search.snapshot(),
                },
            },
        }
    }
}

impl std::fmt::Debug for CatalogFeedManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogFeedManager")
            .field("address", &*self.inner.address.borrow())
            .field("highlights", &self.inner.highlights)
            .field("search", &self.inner.search)
            .field("newest", &self.inner.newest)
            .finish()
    }
}
