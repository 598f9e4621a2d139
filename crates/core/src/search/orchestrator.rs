use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::feed::CatalogFeedManager;
use crate::gateway::{CatalogGateway, CatalogPage};
use crate::metrics;
use crate::slot::{SlotSnapshot, TaskSlot};

use super::debounce::Debouncer;
use super::tier::{SearchTier, ValidationRejection};

/// Result of [`SearchOrchestrator::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The trimmed text became the committed query.
    Committed(String),
    /// Nothing was committed; the input is left as it was.
    Rejected(ValidationRejection),
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

struct SearchState {
    /// Live input, exactly as typed.
    input: String,
    /// Trimmed value of the last debounced evaluation.
    last_evaluated: Option<String>,
}

struct SearchShared {
    gateway: Arc<dyn CatalogGateway>,
    preview_page_size: u32,
    preview: TaskSlot<CatalogPage>,
    state: Mutex<SearchState>,
}

impl SearchShared {
    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Debounced evaluation of a settled input value.
    ///
    /// The state lock is held until the preview slot has been updated.
    fn evaluate(&self, raw: String) {
        let trimmed = raw.trim().to_string();
        let mut state = self.lock();
        // The input was cleared or replaced after this value settled.
        if state.input != raw {
            return;
        }
        if state.last_evaluated.as_deref() == Some(trimmed.as_str()) {
            debug!(query = %trimmed, "Search input unchanged, skipping");
            return;
        }
        state.last_evaluated = Some(trimmed.clone());

        let tier = SearchTier::classify(&trimmed);
        metrics::SEARCH_EVALUATIONS
            .with_label_values(&[tier.as_str()])
            .inc();

        let Some(criteria) = tier.criteria() else {
            debug!(query = %trimmed, tier = tier.as_str(), "Clearing preview");
            self.preview.reset();
            return;
        };

        debug!(query = %trimmed, tier = tier.as_str(), "Loading preview");
        let gateway = Arc::clone(&self.gateway);
        let page_size = self.preview_page_size;
        self.preview.submit(move |cancel| async move {
            gateway.search(&criteria, 1, page_size, cancel).await
        });
    }

    /// Clear the preview and forget the last evaluation.
    fn clear_preview(&self, state: &mut SearchState) {
        state.last_evaluated = None;
        self.preview.reset();
    }
}

/// Drives the header search box: a debounced, tiered preview of matches and
/// the commit of a query to the main view.
///
/// Must be created within a Tokio runtime. Dropping it stops the debouncer
/// and cancels the preview request in flight.
pub struct SearchOrchestrator {
    shared: Arc<SearchShared>,
    debouncer: Debouncer<String>,
    feed: CatalogFeedManager,
}

impl SearchOrchestrator {
    pub fn new(
        gateway: Arc<dyn CatalogGateway>,
        config: &SearchConfig,
        feed: CatalogFeedManager,
    ) -> Self {
        let shared = Arc::new(SearchShared {
            gateway,
            preview_page_size: config.preview_page_size,
            preview: TaskSlot::new("preview"),
            state: Mutex::new(SearchState {
                input: String::new(),
                last_evaluated: None,
            }),
        });

        let evaluator = Arc::clone(&shared);
        let debouncer = Debouncer::spawn(config.debounce(), move |raw| evaluator.evaluate(raw));

        Self {
            shared,
            debouncer,
            feed,
        }
    }

    /// The search input changed.
    pub fn input(&self, raw: &str) {
        self.shared.lock().input = raw.to_string();
        self.debouncer.push(raw.to_string());
    }

    /// Current live input.
    pub fn input_text(&self) -> String {
        self.shared.lock().input.clone()
    }

    /// Submit the current input as the committed query.
    ///
    /// On success the input and the preview are cleared and the feed manager
    /// switches to the query at page 1. Empty and two-character inputs are
    /// refused and leave everything untouched.
    pub fn commit(&self) -> CommitOutcome {
        let mut state = self.shared.lock();
        let tier = SearchTier::classify(&state.input);

        if let Err(rejection) = tier.validate_commit() {
            debug!(input = %state.input, reason = %rejection, "Commit refused");
            return CommitOutcome::Rejected(rejection);
        }

        let query = state.input.trim().to_string();
        state.input.clear();
        self.debouncer.discard();
        self.shared.clear_preview(&mut state);
        drop(state);

        info!(query = %query, tier = tier.as_str(), "Search committed");
        self.feed.commit(&query);
        CommitOutcome::Committed(query)
    }

    /// The search box lost focus: hide the preview.
    ///
    /// A pending evaluation is dropped too, so the preview does not reopen
    /// by itself. The input text is kept.
    pub fn dismiss(&self) {
        let mut state = self.shared.lock();
        self.debouncer.discard();
        self.shared.clear_preview(&mut state);
        debug!("Search preview dismissed");
    }

    /// An entry of the preview was picked: clear input and preview.
    pub fn select_result(&self) {
        let mut state = self.shared.lock();
        state.input.clear();
        self.debouncer.discard();
        self.shared.clear_preview(&mut state);
        debug!("Search preview entry selected");
    }

    /// Stop the debouncer and cancel the preview request in flight.
    pub fn shutdown(&self) {
        self.debouncer.shutdown();
        self.shared.preview.cancel_in_flight();
    }

    pub fn preview(&self) -> SlotSnapshot<CatalogPage> {
        self.shared.preview.snapshot()
    }

    pub fn subscribe_preview(&self) -> watch::Receiver<SlotSnapshot<CatalogPage>> {
        self.shared.preview.subscribe()
    }
}

impl Drop for SearchOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("input", &self.shared.lock().input)
            .field("preview", &self.shared.preview)
            .finish()
    }
}
