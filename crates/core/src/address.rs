//! Addressable browse state (`?q=...&page=...`).
//!
//! The main view's committed query and page live in the address so they
//! survive reloads and can be shared. The feed manager reacts to changes of
//! this value; it never reads the live search input.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Committed query and page of the main view.
///
/// The query is stored trimmed and is never empty; a missing query means the
/// newest-releases feed is shown. Pages start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrowseAddress {
    query: Option<String>,
    page: u32,
}

impl Default for BrowseAddress {
    fn default() -> Self {
        Self::home()
    }
}

impl BrowseAddress {
    /// No query, first page.
    pub fn home() -> Self {
        Self {
            query: None,
            page: 1,
        }
    }

    /// First page of a committed query.
    pub fn search(query: &str) -> Self {
        Self::new(Some(query), 1)
    }

    pub fn new(query: Option<&str>, page: u32) -> Self {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        Self {
            query,
            page: page.max(1),
        }
    }

    /// Same query, another page.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            query: self.query.clone(),
            page: page.max(1),
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Whether the newest-releases feed (and the highlights) are shown.
    pub fn is_home(&self) -> bool {
        self.query.is_none()
    }

    /// Parse a query string, with or without the leading `?`.
    ///
    /// Unknown keys are ignored. A missing, non-numeric or zero page reads
    /// as page 1.
    pub fn from_query_string(raw: &str) -> Self {
        let mut query: Option<String> = None;
        let mut page: Option<u32> = None;

        for pair in raw.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "q" if query.is_none() => query = Some(decode(value)),
                "page" if page.is_none() => page = value.trim().parse().ok(),
                _ => {}
            }
        }

        Self::new(query.as_deref(), page.unwrap_or(1))
    }

    /// Encode as a query string without the leading `?`.
    ///
    /// Page 1 is implied and omitted; the home address encodes as "".
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if let Some(query) = &self.query {
            parts.push(format!("q={}", urlencoding::encode(query)));
        }
        if self.page > 1 {
            parts.push(format!("page={}", self.page));
        }
        parts.join("&")
    }
}

impl fmt::Display for BrowseAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

fn decode(value: &str) -> String {
    let value = value.replace('+', " ");
    // Invalid UTF-8 escapes are kept verbatim.
    urlencoding::decode(&value)
        .map(Cow::into_owned)
        .unwrap_or(value)
}
