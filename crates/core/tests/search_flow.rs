//! Header search integration tests.
//!
//! These tests drive the search box through a full browse context:
//! typing -> debounced preview -> commit -> committed results

use std::sync::Arc;
use std::time::Duration;

use anisync_core::{
    testing::{fixtures, init_test_tracing, wait_settled, MockCatalogGateway, MockEndpoint, RecordedCatalogQuery},
    BrowseContext, CommitOutcome, Config, ResultsView, SearchCriteria, SlotPhase,
    ValidationRejection,
};

/// Test helper holding a context over a mock gateway.
struct TestHarness {
    gateway: Arc<MockCatalogGateway>,
    context: BrowseContext,
}

impl TestHarness {
    async fn new() -> Self {
        init_test_tracing();

        let gateway = Arc::new(MockCatalogGateway::new());
        gateway
            .set_items(fixtures::catalog_items(&[
                "Naruto",
                "Naruto Shippuden",
                "Nana",
                "Narue no Sekai",
                "Bleach",
            ]))
            .await;
        gateway
            .set_recent(fixtures::catalog_items(&["Foo", "Foo Season 2", "Bar"]))
            .await;

        let context = BrowseContext::new(gateway.clone(), &Config::default());
        context.feed().enter();

        Self { gateway, context }
    }

    /// Type `text` one character at a time, faster than the debounce window.
    async fn type_text(&self, text: &str) {
        let mut typed = String::new();
        for c in text.chars() {
            typed.push(c);
            self.context.search().input(&typed);
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
    }

    async fn settle_debounce(&self) {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    async fn preview_titles(&self) -> Vec<String> {
        let preview = wait_settled(&mut self.context.search().subscribe_preview()).await;
        preview
            .value
            .map(|page| page.items.into_iter().map(|item| item.title).collect())
            .unwrap_or_default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_rapid_typing_issues_one_preview_request() {
    let harness = TestHarness::new().await;

    harness.type_text("nar").await;
    harness.settle_debounce().await;

    let titles = harness.preview_titles().await;
    assert_eq!(titles, vec!["Naruto", "Naruto Shippuden", "Narue no Sekai"]);
    assert_eq!(
        harness.gateway.queries_for(MockEndpoint::Search).await,
        vec![RecordedCatalogQuery::Search {
            criteria: SearchCriteria::Text("nar".to_string()),
            page: 1,
            page_size: 5,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_tiers_decide_requests() {
    let harness = TestHarness::new().await;

    harness.context.search().input("n");
    harness.settle_debounce().await;
    assert_eq!(harness.preview_titles().await.len(), 4);

    harness.context.search().input("na");
    harness.settle_debounce().await;
    assert_eq!(harness.context.search().preview().phase, SlotPhase::Idle);

    harness.context.search().input("nar");
    harness.settle_debounce().await;
    harness.preview_titles().await;

    let criteria: Vec<SearchCriteria> = harness
        .gateway
        .queries_for(MockEndpoint::Search)
        .await
        .into_iter()
        .filter_map(|query| match query {
            RecordedCatalogQuery::Search { criteria, .. } => Some(criteria),
            _ => None,
        })
        .collect();
    assert_eq!(
        criteria,
        vec![
            SearchCriteria::Prefix('n'),
            SearchCriteria::Text("nar".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_older_preview_never_overwrites_newer_one() {
    let harness = TestHarness::new().await;
    harness
        .gateway
        .set_search_delay("nar", Duration::from_millis(2_000))
        .await;

    harness.context.search().input("nar");
    harness.settle_debounce().await;
    harness.context.search().input("naruto");
    harness.settle_debounce().await;

    assert_eq!(
        harness.preview_titles().await,
        vec!["Naruto", "Naruto Shippuden"]
    );

    // Let the slow request run out; its result must not replace the newer one.
    tokio::time::sleep(Duration::from_secs(3)).await;
    let preview = harness.context.search().preview();
    assert_eq!(preview.phase, SlotPhase::Succeeded);
    assert_eq!(preview.value.unwrap().items.len(), 2);
    assert_eq!(preview.generation, 2);

    let cancelled = harness.gateway.cancelled_queries().await;
    assert!(cancelled.contains(&RecordedCatalogQuery::Search {
        criteria: SearchCriteria::Text("nar".to_string()),
        page: 1,
        page_size: 5,
    }));
}

#[tokio::test(start_paused = true)]
async fn test_short_commit_keeps_input_and_address() {
    let harness = TestHarness::new().await;
    let address_before = harness.context.feed().address();

    harness.context.search().input("na");
    let outcome = harness.context.search().commit();

    assert_eq!(
        outcome,
        CommitOutcome::Rejected(ValidationRejection::QueryTooShort)
    );
    assert_eq!(harness.context.search().input_text(), "na");
    assert_eq!(harness.context.feed().address(), address_before);
}

#[tokio::test(start_paused = true)]
async fn test_commit_shows_committed_results() {
    let harness = TestHarness::new().await;
    wait_settled(&mut harness.context.feed().subscribe_newest()).await;

    harness.type_text("bleach").await;
    let outcome = harness.context.search().commit();
    assert!(outcome.is_committed());

    let results = wait_settled(&mut harness.context.feed().subscribe_search_results()).await;
    assert_eq!(results.phase, SlotPhase::Succeeded);

    match harness.context.feed().results_view() {
        ResultsView::Search { query, results } => {
            assert_eq!(query, "bleach");
            assert_eq!(results.value.unwrap().items[0].title, "Bleach");
        }
        other => panic!("Expected search results, got {:?}", other),
    }
    assert!(harness.context.feed().newest().is_idle());
    assert_eq!(harness.context.feed().address().to_query_string(), "q=bleach");

    // No preview fires after the commit cleared the input.
    harness.settle_debounce().await;
    assert!(harness.context.search().preview().is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_failed_preview_keeps_error_message() {
    let harness = TestHarness::new().await;
    harness
        .gateway
        .fail_endpoint(MockEndpoint::Search, "upstream unavailable")
        .await;

    harness.context.search().input("bleach");
    harness.settle_debounce().await;

    let preview = wait_settled(&mut harness.context.search().subscribe_preview()).await;
    assert_eq!(preview.phase, SlotPhase::Failed);
    assert!(preview.error.unwrap().contains("upstream unavailable"));
}
