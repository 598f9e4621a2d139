//! Trailing-edge debouncer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

enum DebounceCommand<T> {
    Push(T),
    Discard,
}

/// Calls `on_settle` with the last pushed value once no new value has
/// arrived for `window`.
///
/// Only one evaluation is ever pending; each push restarts the window.
/// Dropping the debouncer stops its task without firing.
#[derive(Debug)]
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<DebounceCommand<T>>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Send + 'static,
{
    /// Spawn the debouncer task. Must be called from within a Tokio runtime.
    pub fn spawn<F>(window: Duration, mut on_settle: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();

        let task = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    command = rx.recv() => match command {
                        Some(DebounceCommand::Push(value)) => pending = Some(value),
                        Some(DebounceCommand::Discard) => pending = None,
                        None => break,
                    },
                    _ = tokio::time::sleep(window), if pending.is_some() => {
                        if let Some(value) = pending.take() {
                            on_settle(value);
                        }
                    }
                }
            }
            debug!("Debouncer stopped");
        });

        Self {
            tx,
            shutdown,
            task,
        }
    }

    /// Replace the pending value and restart the window.
    pub fn push(&self, value: T) {
        // Fails only once the task has stopped, when nothing may fire anyway.
        let _ = self.tx.send(DebounceCommand::Push(value));
    }

    /// Drop the pending value, if any.
    pub fn discard(&self) {
        let _ = self.tx.send(DebounceCommand::Discard);
    }

    /// Stop the task; pending values never fire.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
