//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Task slots (submissions and how their completions were handled)
//! - Search (debounced evaluations per tier)
//! - Gateway (requests per endpoint)
//!
//! Nothing is registered automatically; embedders pass [`all_metrics`] to
//! their own registry.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

// =============================================================================
// Task Slot Metrics
// =============================================================================

/// Task submissions total by slot.
pub static SLOT_SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "anisync_slot_submissions_total",
            "Total tasks submitted to a slot",
        ),
        &["slot"],
    )
    .unwrap()
});

/// Task completions total by slot and outcome.
pub static SLOT_COMPLETIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "anisync_slot_completions_total",
            "Total task completions seen by a slot",
        ),
        &["slot", "outcome"], // "succeeded", "failed", "stale", "cancelled"
    )
    .unwrap()
});

/// Time from submission to accepted completion.
pub static SLOT_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "anisync_slot_latency_seconds",
            "Time from submission to accepted completion",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["slot"],
    )
    .unwrap()
});

// =============================================================================
// Search Metrics
// =============================================================================

/// Debounced search evaluations by tier.
pub static SEARCH_EVALUATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "anisync_search_evaluations_total",
            "Debounced search input evaluations",
        ),
        &["tier"], // "browse", "prefix", "dead_zone", "full_text"
    )
    .unwrap()
});

// =============================================================================
// Gateway Metrics
// =============================================================================

/// Gateway requests total by endpoint.
pub static GATEWAY_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "anisync_gateway_requests_total",
            "Total requests issued to the remote catalog",
        ),
        &["endpoint"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Slots
        Box::new(SLOT_SUBMISSIONS.clone()),
        Box::new(SLOT_COMPLETIONS.clone()),
        Box::new(SLOT_LATENCY.clone()),
        // Search
        Box::new(SEARCH_EVALUATIONS.clone()),
        // Gateway
        Box::new(GATEWAY_REQUESTS.clone()),
    ]
}

/// Register all core metrics in `registry`.
pub fn register_metrics(registry: &Registry) -> prometheus::Result<()> {
    for metric in all_metrics() {
        registry.register(metric)?;
    }
    Ok(())
}
