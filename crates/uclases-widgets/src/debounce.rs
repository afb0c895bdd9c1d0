use std::time::Duration;

use tokio::task::{AbortHandle, JoinSet};
use tokio::time::sleep;

/// Cancelable trailing-edge debounce.
///
/// Every [`schedule`](Self::schedule) aborts the pending timer and starts a
/// new one; only the latest generation counts as current. A timer that
/// already elapsed but was not yet handled is recognised as stale through
/// its generation.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    pending: Option<AbortHandle>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    /// Restart the timer. `make` builds the value delivered to `tasks` once
    /// the delay elapses, tagged with the new generation.
    pub fn schedule<T, F>(&mut self, tasks: &mut JoinSet<T>, make: F) -> u64
    where
        T: Send + 'static,
        F: FnOnce(u64) -> T,
    {
        self.cancel();
        let generation = self.generation;
        let output = make(generation);
        let delay = self.delay;
        self.pending = Some(tasks.spawn(async move {
            sleep(delay).await;
            output
        }));
        generation
    }

    /// Drop the pending emission, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.pending.is_some() && generation == self.generation
    }

    /// Mark the current timer as delivered.
    pub fn fired(&mut self) {
        self.pending = None;
    }
}
