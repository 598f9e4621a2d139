//! Header search: debounced preview and query commit.
//!
//! Input is classified by trimmed length:
//! - empty: nothing to preview
//! - one character: titles starting with that letter
//! - two characters: nothing is requested and commits are refused
//! - three or more: full-text search

mod debounce;
mod orchestrator;
mod tier;

pub use debounce::Debouncer;
pub use orchestrator::{CommitOutcome, SearchOrchestrator};
pub use tier::{SearchTier, ValidationRejection};
