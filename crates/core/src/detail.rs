//! Detail page of a single catalog entry.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::info;

use crate::gateway::{CatalogGateway, CatalogItem, RelationGroup};
use crate::slot::{SlotSnapshot, TaskSlot};

/// Loads one entry and its relations into two independent slots.
///
/// A failure of the relations request leaves the entry untouched and the
/// other way round. Dropping the view cancels both requests.
pub struct DetailView {
    gateway: Arc<dyn CatalogGateway>,
    item: TaskSlot<CatalogItem>,
    relations: TaskSlot<Vec<RelationGroup>>,
    current: Mutex<Option<u32>>,
}

impl DetailView {
    pub fn new(gateway: Arc<dyn CatalogGateway>) -> Self {
        Self {
            gateway,
            item: TaskSlot::new("detail"),
            relations: TaskSlot::new("relations"),
            current: Mutex::new(None),
        }
    }

    /// Show entry `id`.
    ///
    /// The previous entry is cleared right away so it never shows while the
    /// new one loads.
    pub fn open(&self, id: u32) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
        info!(id, "Opening detail view");

        self.item.reset();
        self.relations.reset();

        let gateway = Arc::clone(&self.gateway);
        self.item
            .submit(move |cancel| async move { gateway.get_by_id(id, cancel).await });

        let gateway = Arc::clone(&self.gateway);
        self.relations
            .submit(move |cancel| async move { gateway.get_relations(id, cancel).await });
    }

    /// Cancel both requests; loaded contents are kept.
    pub fn close(&self) {
        self.item.cancel_in_flight();
        self.relations.cancel_in_flight();
    }

    /// ID of the entry last opened.
    pub fn current_id(&self) -> Option<u32> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn item(&self) -> SlotSnapshot<CatalogItem> {
        self.item.snapshot()
    }

    pub fn subscribe_item(&self) -> watch::Receiver<SlotSnapshot<CatalogItem>> {
        self.item.subscribe()
    }

    pub fn relations(&self) -> SlotSnapshot<Vec<RelationGroup>> {
        self.relations.snapshot()
    }

    pub fn subscribe_relations(&self) -> watch::Receiver<SlotSnapshot<Vec<RelationGroup>>> {
        self.relations.subscribe()
    }
}

impl std::fmt::Debug for DetailView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailView")
            .field("current", &self.current_id())
            .field("item", &self.item)
            .field("relations", &self.relations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotPhase;
    use crate::testing::{fixtures, wait_settled, MockCatalogGateway, MockEndpoint};
    use std::time::Duration;

    async fn setup() -> (Arc<MockCatalogGateway>, DetailView) {
        let gateway = Arc::new(MockCatalogGateway::new());
        gateway
            .set_items(fixtures::catalog_items(&["Cowboy Bebop", "Trigun"]))
            .await;
        gateway
            .set_relations(
                1,
                vec![fixtures::relation_group("Side story", &[(5, "Cowboy Bebop: The Movie")])],
            )
            .await;

        let view = DetailView::new(gateway.clone());
        (gateway, view)
    }

    #[tokio::test]
    async fn test_open_loads_item_and_relations() {
        let (_gateway, view) = setup().await;
        view.open(1);

        let item = wait_settled(&mut view.subscribe_item()).await;
        assert_eq!(item.value.unwrap().title, "Cowboy Bebop");

        let relations = wait_settled(&mut view.subscribe_relations()).await;
        assert_eq!(relations.value.unwrap()[0].relation, "Side story");
        assert_eq!(view.current_id(), Some(1));
    }

    #[tokio::test]
    async fn test_previous_entry_is_not_shown_while_loading() {
        let (gateway, view) = setup().await;
        view.open(1);
        wait_settled(&mut view.subscribe_item()).await;

        gateway.hold(MockEndpoint::Detail).await;
        view.open(2);

        let item = view.item();
        assert_eq!(item.phase, SlotPhase::Loading);
        assert!(item.value.is_none());
        assert!(view.relations().value.is_none());

        gateway.release(MockEndpoint::Detail).await;
        let item = wait_settled(&mut view.subscribe_item()).await;
        assert_eq!(item.value.unwrap().title, "Trigun");
    }

    #[tokio::test]
    async fn test_relations_failure_leaves_item_alone() {
        let (gateway, view) = setup().await;
        gateway.fail_endpoint(MockEndpoint::Relations, "boom").await;

        view.open(1);

        let item = wait_settled(&mut view.subscribe_item()).await;
        let relations = wait_settled(&mut view.subscribe_relations()).await;
        assert_eq!(item.phase, SlotPhase::Succeeded);
        assert_eq!(relations.phase, SlotPhase::Failed);
        assert!(relations.error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_missing_entry_fails_item_slot() {
        let (_gateway, view) = setup().await;
        view.open(99);

        let item = wait_settled(&mut view.subscribe_item()).await;
        assert!(item.is_failed());
        assert!(item.error.unwrap().contains("not found"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_navigation_shows_last_entry() {
        let (gateway, view) = setup().await;
        gateway
            .set_delay(MockEndpoint::Detail, Duration::from_millis(200))
            .await;

        view.open(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        view.open(2);

        let item = wait_settled(&mut view.subscribe_item()).await;
        assert_eq!(item.value.unwrap().id, 2);
        assert_eq!(item.generation, 2);
    }

    #[tokio::test]
    async fn test_close_cancels_requests() {
        let (gateway, view) = setup().await;
        gateway.hold(MockEndpoint::Detail).await;
        gateway.hold(MockEndpoint::Relations).await;

        view.open(1);
        while gateway.query_count().await < 2 {
            tokio::task::yield_now().await;
        }
        view.close();

        assert_eq!(gateway.cancelled_queries().await.len(), 2);
    }
}
