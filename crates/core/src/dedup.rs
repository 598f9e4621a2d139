//! Deduplication of feed entries by normalized title.
//!
//! The newest-releases feed tends to list every season and split-cour part of
//! a show. Only the first entry per show is kept for display.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::gateway::CatalogItem;

/// Trailing season/part/cour marker. It must start a word and be separated
/// from the title by whitespace or a `:`/`-`.
static SEASON_MARKER: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\s*[:\-]\s*|\s+)\b(season\s+\d+|part\s+\d+|\d+(st|nd|rd|th)\s+season|cour\s+\d+)\s*$",
    )
    .ok()
});

/// Strip season/part/cour markers from the end of a title.
///
/// Markers are removed repeatedly, so "Foo Season 2 Part 2" becomes "Foo".
pub fn normalize_title(title: &str) -> String {
    let mut normalized = title.trim().to_string();

    if let Some(re) = SEASON_MARKER.as_ref() {
        while let Some(m) = re.find(&normalized) {
            if m.start() == 0 {
                // The whole title is a marker ("Season 2"); keep it.
                break;
            }
            normalized.truncate(m.start());
            normalized = normalized.trim_end().to_string();
        }
    }

    normalized
}

/// Keep the first entry per normalized title, in input order, then truncate
/// to `limit` entries.
pub fn dedup_by_title(items: Vec<CatalogItem>, limit: usize) -> Vec<CatalogItem> {
    let mut seen: HashSet<String> = HashSet::new();

    items
        .into_iter()
        .filter(|item| seen.insert(normalize_title(&item.title)))
        .take(limit)
        .collect()
}
