//! Testing utilities and a mock catalog gateway.
//!
//! [`MockCatalogGateway`] stands in for the remote catalog so every component
//! can be exercised without network access, with controllable latency and
//! failures.
//!
//! # Example
//!
//! ```rust,ignore
//! use anisync_core::testing::{fixtures, MockCatalogGateway};
//!
//! let gateway = MockCatalogGateway::new();
//! gateway.set_items(fixtures::catalog_items(&["Naruto", "Bleach"])).await;
//! gateway.set_search_delay("nar", Duration::from_millis(500)).await;
//!
//! // Hand `Arc::new(gateway)` to a BrowseContext...
//! ```

mod mock_gateway;

pub use mock_gateway::{MockCatalogGateway, MockEndpoint, RecordedCatalogQuery};

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::slot::SlotSnapshot;

/// Install a test subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Wait until a slot leaves the loading phase and return its state.
///
/// Returns the last published state if the slot is dropped first.
pub async fn wait_settled<T: Clone>(rx: &mut watch::Receiver<SlotSnapshot<T>>) -> SlotSnapshot<T> {
    let settled = rx
        .wait_for(|snapshot| !snapshot.is_loading())
        .await
        .map(|snapshot| snapshot.clone());
    settled.unwrap_or_else(|_| rx.borrow().clone())
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::gateway::{
        CatalogItem, CatalogPage, ImageSet, ImageVariants, PageInfo, RelatedEntry, RelationGroup,
        Tag,
    };

    /// Create a catalog entry with reasonable defaults.
    pub fn catalog_item(id: u32, title: &str) -> CatalogItem {
        let slug = title.to_lowercase().replace(' ', "-");
        CatalogItem {
            id,
            title: title.to_string(),
            title_english: None,
            title_japanese: None,
            images: ImageSet {
                jpg: ImageVariants {
                    small: Some(format!("https://cdn.example/{}/small.jpg", slug)),
                    regular: Some(format!("https://cdn.example/{}/regular.jpg", slug)),
                    large: Some(format!("https://cdn.example/{}/large.jpg", slug)),
                },
                webp: ImageVariants::default(),
            },
            score: Some(7.5),
            scored_by: Some(1000),
            rank: Some(id),
            popularity: Some(id),
            episodes: Some(12),
            status: Some("Finished Airing".to_string()),
            airing: false,
            media_type: Some("TV".to_string()),
            aired: None,
            season: None,
            year: None,
            rating: Some("PG-13 - Teens 13 or older".to_string()),
            duration: Some("24 min per ep".to_string()),
            synopsis: format!("A show called {}.", title),
            genres: vec![Tag {
                id: 1,
                name: "Action".to_string(),
            }],
            trailer: None,
        }
    }

    /// Create an airing catalog entry.
    pub fn airing_item(id: u32, title: &str) -> CatalogItem {
        let mut item = catalog_item(id, title);
        item.airing = true;
        item.episodes = None;
        item.status = Some("Currently Airing".to_string());
        item
    }

    /// Create entries with IDs 1, 2, ... in the given order.
    pub fn catalog_items(titles: &[&str]) -> Vec<CatalogItem> {
        titles
            .iter()
            .zip(1u32..)
            .map(|(title, id)| catalog_item(id, title))
            .collect()
    }

    /// Create a page with consistent pagination info.
    pub fn catalog_page(items: Vec<CatalogItem>, current_page: u32, last_page: u32) -> CatalogPage {
        CatalogPage {
            items,
            page: Some(PageInfo::new(current_page, last_page)),
        }
    }

    /// Create a relation group pointing at anime entries.
    pub fn relation_group(relation: &str, entries: &[(u32, &str)]) -> RelationGroup {
        RelationGroup {
            relation: relation.to_string(),
            entries: entries
                .iter()
                .map(|(id, name)| RelatedEntry {
                    id: *id,
                    name: name.to_string(),
                    kind: "anime".to_string(),
                })
                .collect(),
        }
    }
}
