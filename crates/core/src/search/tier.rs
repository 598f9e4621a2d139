//! Classification of search input by length.

use thiserror::Error;

use crate::gateway::SearchCriteria;

/// What a (trimmed) search string asks for.
///
/// Two-character strings are deliberately not searchable: the catalog's
/// full-text search returns noise for them and the letter search only takes
/// one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTier {
    /// Empty input: no active query.
    Browse,
    /// Single character: titles starting with that letter.
    Prefix(char),
    /// Two characters: nothing is requested.
    DeadZone,
    /// Three characters or more: full-text search.
    FullText(String),
}

impl SearchTier {
    /// Classify `raw` after trimming surrounding whitespace.
    ///
    /// Length is counted in characters, not bytes.
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();

        match (chars.next(), chars.next(), chars.next()) {
            (None, _, _) => Self::Browse,
            (Some(letter), None, _) => Self::Prefix(letter),
            (Some(_), Some(_), None) => Self::DeadZone,
            _ => Self::FullText(trimmed.to_string()),
        }
    }

    /// Gateway criteria for this tier, `None` when nothing should be fetched.
    pub fn criteria(&self) -> Option<SearchCriteria> {
        match self {
            Self::Prefix(letter) => Some(SearchCriteria::Prefix(*letter)),
            Self::FullText(text) => Some(SearchCriteria::Text(text.clone())),
            Self::Browse | Self::DeadZone => None,
        }
    }

    /// Check whether the input may be committed as a query.
    pub fn validate_commit(&self) -> Result<(), ValidationRejection> {
        match self {
            Self::Browse => Err(ValidationRejection::EmptyQuery),
            Self::DeadZone => Err(ValidationRejection::QueryTooShort),
            Self::Prefix(_) | Self::FullText(_) => Ok(()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::Prefix(_) => "prefix",
            Self::DeadZone => "dead_zone",
            Self::FullText(_) => "full_text",
        }
    }
}

/// Input refused before any request is made.
///
/// This is an informational state for the user, never a slot failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationRejection {
    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Please enter at least 3 characters for a search query")]
    QueryTooShort,
}
