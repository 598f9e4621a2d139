//! Generation-checked async state slots.
//!
//! A [`TaskSlot`] holds the state of one asynchronous value (phase, last good
//! value, last error) and runs at most one *current* task for it. Submitting
//! a new task supersedes the previous one: the old task's cancellation token
//! fires and its eventual completion is discarded, so results are always
//! accepted in submission order no matter how the network orders them.
//!
//! Views read slots through [`TaskSlot::snapshot`] or subscribe to changes
//! with [`TaskSlot::subscribe`]; only the owning component mutates them.

mod types;

pub use types::{Completion, SlotPhase, SlotSnapshot, Submission};

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::gateway::CatalogError;
use crate::metrics;

/// Mutable part of a slot, guarded by the slot mutex.
struct SlotState<T> {
    snapshot: SlotSnapshot<T>,
    /// Token of the current task, if one is in flight.
    cancel: Option<CancellationToken>,
    submitted_at: Option<Instant>,
}

struct SlotShared<T> {
    name: &'static str,
    state: Mutex<SlotState<T>>,
    watch: watch::Sender<SlotSnapshot<T>>,
}

impl<T> SlotShared<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push the current state to subscribers. Called with the lock held so
    /// subscribers observe transitions in the order they happened.
    fn publish(&self, state: &SlotState<T>) {
        self.watch.send_replace(state.snapshot.clone());
    }

    /// Apply a task result if it still belongs to the current generation.
    fn complete(
        &self,
        generation: u64,
        token: &CancellationToken,
        result: Result<T, CatalogError>,
    ) -> Completion {
        let mut state = self.lock();
        let current = state.snapshot.generation == generation;

        let completion = match result {
            Err(e) if e.is_cancellation() => Completion::Cancelled,
            _ if !current || token.is_cancelled() => Completion::Stale,
            Ok(value) => {
                state.snapshot.phase = SlotPhase::Succeeded;
                state.snapshot.value = Some(value);
                state.snapshot.error = None;
                Completion::Succeeded
            }
            Err(e) => {
                warn!(slot = self.name, generation, error = %e, "Slot task failed");
                state.snapshot.phase = SlotPhase::Failed;
                state.snapshot.error = Some(e.to_string());
                Completion::Failed
            }
        };

        if current {
            state.cancel = None;
        }
        if completion.is_accepted() {
            if let Some(submitted_at) = state.submitted_at.take() {
                metrics::SLOT_LATENCY
                    .with_label_values(&[self.name])
                    .observe(submitted_at.elapsed().as_secs_f64());
            }
            self.publish(&state);
        }

        metrics::SLOT_COMPLETIONS
            .with_label_values(&[self.name, completion.as_str()])
            .inc();
        debug!(
            slot = self.name,
            generation,
            outcome = completion.as_str(),
            "Slot task completed"
        );

        completion
    }
}

/// One named unit of asynchronous state.
///
/// Dropping the slot cancels its in-flight task.
pub struct TaskSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    shared: Arc<SlotShared<T>>,
}

impl<T> TaskSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an idle slot.
    pub fn new(name: &'static str) -> Self {
        let snapshot = SlotSnapshot::idle();
        let (watch, _) = watch::channel(snapshot.clone());

        Self {
            shared: Arc::new(SlotShared {
                name,
                state: Mutex::new(SlotState {
                    snapshot,
                    cancel: None,
                    submitted_at: None,
                }),
                watch,
            }),
        }
    }

    /// Slot name, used in logs and metrics.
    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    /// Submit a new task, superseding any task in flight.
    ///
    /// `task` receives the cancellation token of this submission and must
    /// pass it down to the gateway. Must be called from within a Tokio
    /// runtime.
    pub fn submit<F, Fut>(&self, task: F) -> Submission
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, CatalogError>> + Send + 'static,
    {
        let token = CancellationToken::new();

        let generation = {
            let mut state = self.shared.lock();
            if let Some(previous) = state.cancel.replace(token.clone()) {
                previous.cancel();
            }
            state.snapshot.generation += 1;
            state.snapshot.phase = SlotPhase::Loading;
            state.submitted_at = Some(Instant::now());
            self.shared.publish(&state);
            state.snapshot.generation
        };

        metrics::SLOT_SUBMISSIONS
            .with_label_values(&[self.shared.name])
            .inc();
        debug!(slot = self.shared.name, generation, "Slot task submitted");

        let future = task(token.clone());
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(CatalogError::Cancelled),
                result = future => result,
            };
            shared.complete(generation, &token, result)
        });

        Submission::new(generation, handle)
    }

    /// Return to idle and drop value and error.
    ///
    /// The generation is left alone; the in-flight task, if any, is
    /// cancelled and its completion will be discarded.
    pub fn reset(&self) {
        let mut state = self.shared.lock();
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        state.snapshot.phase = SlotPhase::Idle;
        state.snapshot.value = None;
        state.snapshot.error = None;
        state.submitted_at = None;
        self.shared.publish(&state);
        debug!(slot = self.shared.name, "Slot reset");
    }

    /// Cancel the in-flight task without touching the phase.
    pub fn cancel_in_flight(&self) {
        let mut state = self.shared.lock();
        if let Some(token) = state.cancel.take() {
            debug!(
                slot = self.shared.name,
                generation = state.snapshot.generation,
                "Cancelling in-flight task"
            );
            token.cancel();
        }
    }

    /// Whether a task for the current generation is still running.
    pub fn is_in_flight(&self) -> bool {
        self.shared.lock().cancel.is_some()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.shared.lock().snapshot.generation
    }

    /// Read-only copy of the current state.
    pub fn snapshot(&self) -> SlotSnapshot<T> {
        self.shared.lock().snapshot.clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SlotSnapshot<T>> {
        self.shared.watch.subscribe()
    }
}

impl<T> Drop for TaskSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

impl<T> std::fmt::Debug for TaskSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("TaskSlot")
            .field("name", &self.shared.name)
            .field("phase", &state.snapshot.phase)
            .field("generation", &state.snapshot.generation)
            .field("in_flight", &state.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::oneshot;

    fn pending_task(
        rx: oneshot::Receiver<Result<u32, CatalogError>>,
    ) -> impl Future<Output = Result<u32, CatalogError>> + Send + 'static {
        async move {
            rx.await
                .unwrap_or_else(|_| Err(CatalogError::NotFound("sender dropped".to_string())))
        }
    }

    #[tokio::test]
    async fn test_new_slot_is_idle() {
        let slot: TaskSlot<u32> = TaskSlot::new("test");
        let snapshot = slot.snapshot();
        assert_eq!(snapshot.phase, SlotPhase::Idle);
        assert!(snapshot.value.is_none());
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.generation, 0);
        assert!(!slot.is_in_flight());
    }

    #[tokio::test]
    async fn test_submit_success() {
        let slot = TaskSlot::new("test");

        let submission = slot.submit(|_| async { Ok(7u32) });
        assert_eq!(submission.generation(), 1);
        assert_eq!(slot.snapshot().phase, SlotPhase::Loading);

        assert_eq!(submission.completion().await, Completion::Succeeded);
        let snapshot = slot.snapshot();
        assert_eq!(snapshot.phase, SlotPhase::Succeeded);
        assert_eq!(snapshot.value, Some(7));
        assert!(snapshot.error.is_none());
        assert!(!slot.is_in_flight());
    }

    #[tokio::test]
    async fn test_completion_pending_until_task_resolves() {
        let slot = TaskSlot::new("test");
        let (tx, rx) = oneshot::channel();

        let mut completion = tokio_test::task::spawn(slot.submit(|_| pending_task(rx)).completion());
        tokio_test::assert_pending!(completion.poll());
        assert!(slot.is_in_flight());

        tx.send(Ok(4)).unwrap();
        assert_eq!(completion.await, Completion::Succeeded);
        assert_eq!(slot.snapshot().value, Some(4));
    }

    #[tokio::test]
    async fn test_failure_keeps_last_good_value() {
        let slot = TaskSlot::new("test");
        slot.submit(|_| async { Ok(1u32) }).completion().await;

        let completion = slot
            .submit(|_| async { Err(CatalogError::RateLimitExceeded) })
            .completion()
            .await;

        assert_eq!(completion, Completion::Failed);
        let snapshot = slot.snapshot();
        assert_eq!(snapshot.phase, SlotPhase::Failed);
        assert_eq!(snapshot.value, Some(1));
        assert!(snapshot.error.unwrap().contains("Rate limit"));
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let slot = TaskSlot::new("test");
        slot.submit(|_| async { Err::<u32, _>(CatalogError::RateLimitExceeded) })
            .completion()
            .await;
        slot.submit(|_| async { Ok(2u32) }).completion().await;

        let snapshot = slot.snapshot();
        assert_eq!(snapshot.phase, SlotPhase::Succeeded);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_newer_submission_wins_over_late_older_one() {
        let slot = TaskSlot::new("test");
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();

        let first = slot.submit(|_| pending_task(rx1));
        let second = slot.submit(|_| pending_task(rx2));

        tx2.send(Ok(2)).unwrap();
        assert_eq!(second.completion().await, Completion::Succeeded);

        // The first generation resolves after the second already succeeded.
        let _ = tx1.send(Ok(1));
        assert!(!first.completion().await.is_accepted());

        let snapshot = slot.snapshot();
        assert_eq!(snapshot.value, Some(2));
        assert_eq!(snapshot.generation, 2);
    }

    #[tokio::test]
    async fn test_completion_for_old_generation_is_discarded() {
        let slot = TaskSlot::new("test");
        slot.submit(|_| async { Ok(10u32) }).completion().await;
        slot.submit(|_| async { Ok(20u32) }).completion().await;

        // A gateway that ignored its token delivers generation 1 late.
        let completion = slot
            .shared
            .complete(1, &CancellationToken::new(), Ok(99));

        assert_eq!(completion, Completion::Stale);
        assert_eq!(slot.snapshot().value, Some(20));
        assert_eq!(slot.snapshot().phase, SlotPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_submit_cancels_previous_token() {
        let slot = TaskSlot::new("test");
        let seen = Arc::new(StdMutex::new(None));

        let seen_clone = Arc::clone(&seen);
        let (_tx, rx) = oneshot::channel();
        let first = slot.submit(move |token| {
            *seen_clone.lock().unwrap() = Some(token);
            pending_task(rx)
        });
        slot.submit(|_| async { Ok(5u32) });

        let token = seen.lock().unwrap().clone().unwrap();
        assert!(token.is_cancelled());
        assert_eq!(first.completion().await, Completion::Cancelled);
    }

    #[tokio::test]
    async fn test_reset_keeps_generation_and_discards_in_flight() {
        let slot = TaskSlot::new("test");
        let (tx, rx) = oneshot::channel();
        let submission = slot.submit(|_| pending_task(rx));

        slot.reset();
        assert_eq!(slot.generation(), 1);
        assert_eq!(slot.snapshot().phase, SlotPhase::Idle);

        let _ = tx.send(Ok(3));
        assert_eq!(submission.completion().await, Completion::Cancelled);

        let snapshot = slot.snapshot();
        assert_eq!(snapshot.phase, SlotPhase::Idle);
        assert!(snapshot.value.is_none());
    }

    #[tokio::test]
    async fn test_cancel_in_flight_is_not_a_failure() {
        let slot = TaskSlot::new("test");
        let (_tx, rx) = oneshot::channel();
        let submission = slot.submit(|_| pending_task(rx));

        slot.cancel_in_flight();
        assert_eq!(submission.completion().await, Completion::Cancelled);

        let snapshot = slot.snapshot();
        assert_eq!(snapshot.phase, SlotPhase::Loading);
        assert!(snapshot.error.is_none());
        assert!(!slot.is_in_flight());
    }

    #[tokio::test]
    async fn test_gateway_cancellation_outcome_never_fails_slot() {
        let slot: TaskSlot<u32> = TaskSlot::new("test");
        let completion = slot
            .submit(|_| async { Err(CatalogError::Cancelled) })
            .completion()
            .await;

        assert_eq!(completion, Completion::Cancelled);
        assert_ne!(slot.snapshot().phase, SlotPhase::Failed);
        assert!(slot.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_drop_cancels_in_flight_task() {
        let slot: TaskSlot<u32> = TaskSlot::new("test");
        let seen = Arc::new(StdMutex::new(None));

        let seen_clone = Arc::clone(&seen);
        let (_tx, rx) = oneshot::channel();
        let submission = slot.submit(move |token| {
            *seen_clone.lock().unwrap() = Some(token);
            pending_task(rx)
        });

        drop(slot);

        let token = seen.lock().unwrap().clone().unwrap();
        assert!(token.is_cancelled());
        assert_eq!(submission.completion().await, Completion::Cancelled);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let slot = TaskSlot::new("test");
        let mut rx = slot.subscribe();
        assert_eq!(rx.borrow_and_update().phase, SlotPhase::Idle);

        let submission = slot.submit(|_| async { Ok(1u32) });
        assert!(rx.has_changed().unwrap());
        submission.completion().await;

        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.phase, SlotPhase::Succeeded);
        assert_eq!(snapshot.value, Some(1));
    }
}
