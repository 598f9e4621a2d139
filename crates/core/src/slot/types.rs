//! Slot state types.

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::gateway::{CatalogItem, CatalogPage};

/// Lifecycle phase of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPhase {
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl SlotPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Read-only projection of a slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSnapshot<T> {
    pub phase: SlotPhase,
    /// Last accepted value; survives a later failure.
    pub value: Option<T>,
    /// Message of the last accepted failure.
    pub error: Option<String>,
    pub generation: u64,
}

impl<T> SlotSnapshot<T> {
    pub(crate) fn idle() -> Self {
        Self {
            phase: SlotPhase::Idle,
            value: None,
            error: None,
            generation: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == SlotPhase::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SlotPhase::Loading
    }

    pub fn is_failed(&self) -> bool {
        self.phase == SlotPhase::Failed
    }

    /// Value of a successful load, `None` in any other phase.
    pub fn succeeded_value(&self) -> Option<&T> {
        match self.phase {
            SlotPhase::Succeeded => self.value.as_ref(),
            _ => None,
        }
    }
}

impl SlotSnapshot<CatalogPage> {
    /// Succeeded with nothing to show ("no results", not an error).
    pub fn is_empty_success(&self) -> bool {
        self.succeeded_value().is_some_and(CatalogPage::is_empty)
    }
}

impl SlotSnapshot<Vec<CatalogItem>> {
    /// Succeeded with nothing to show ("no results", not an error).
    pub fn is_empty_success(&self) -> bool {
        self.succeeded_value().is_some_and(Vec::is_empty)
    }
}

/// How a slot handled the completion of one of its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Accepted: the value was stored.
    Succeeded,
    /// Accepted: the error was stored.
    Failed,
    /// The task was cancelled; nothing changed.
    Cancelled,
    /// The task finished after being superseded; nothing changed.
    Stale,
}

impl Completion {
    /// Whether the completion changed the slot.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Stale => "stale",
        }
    }
}

/// Handle to one submission.
///
/// Dropping it does not cancel the task.
#[derive(Debug)]
pub struct Submission {
    generation: u64,
    handle: JoinHandle<Completion>,
}

impl Submission {
    pub(crate) fn new(generation: u64, handle: JoinHandle<Completion>) -> Self {
        Self { generation, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait until the slot has handled the task's completion.
    pub async fn completion(self) -> Completion {
        // An aborted or panicked task never reaches the slot.
        self.handle.await.unwrap_or(Completion::Cancelled)
    }
}
