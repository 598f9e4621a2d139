//! Catalog feeds of the main view.
//!
//! The [`CatalogFeedManager`] owns three slots: the highlights shown on top
//! of the page, the results of the committed search, and the newest
//! releases. The committed search and the newest releases are mutually
//! exclusive; whichever one the current [`BrowseAddress`] selects is the
//! *active* slot, and the other one is cancelled and cleared.
//!
//! [`BrowseAddress`]: crate::address::BrowseAddress

mod manager;
mod types;

pub use manager::CatalogFeedManager;
pub use types::{Highlights, ResultsView};
