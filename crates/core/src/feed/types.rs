use serde::Serialize;

use crate::gateway::{CatalogItem, CatalogPage};
use crate::search::ValidationRejection;
use crate::slot::SlotSnapshot;

/// Top-airing list plus the current-season banner entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlights {
    pub top: Vec<CatalogItem>,
    pub banner: Option<CatalogItem>,
}

/// What the main results panel shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView {
    /// No committed query: the deduplicated newest releases.
    Newest(SlotSnapshot<CatalogPage>),
    /// Results for the committed query.
    Search {
        query: String,
        results: SlotSnapshot<CatalogPage>,
    },
    /// The committed query was refused without a request.
    Rejected {
        query: String,
        rejection: ValidationRejection,
    },
}

impl ResultsView {
    /// Committed query, if any.
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Newest(_) => None,
            Self::Search { query, .. } | Self::Rejected { query, .. } => Some(query),
        }
    }

    /// Snapshot of the slot backing the panel, if a slot backs it.
    pub fn snapshot(&self) -> Option<&SlotSnapshot<CatalogPage>> {
        match self {
            Self::Newest(snapshot) | Self::Search { results: snapshot, .. } => Some(snapshot),
            Self::Rejected { .. } => None,
        }
    }
}
