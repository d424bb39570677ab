//! TTL Scheduler Module
//!
//! One-shot, per-key expiration timers running as Tokio tasks.
//!
//! Each timer carries a generation number. When it fires it hands an
//! [`Expiry`] to its callback, and the callback must [`TtlScheduler::claim`]
//! it under the lock that guards the scheduler. A claim only succeeds for the
//! live generation, so a timer that was cancelled or replaced while it was
//! waking up can never act on the key's newer entry.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

// == Expiry ==
/// Event delivered to a timer's callback when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry {
    pub key: String,
    pub generation: u64,
}

#[derive(Debug)]
struct TimerHandle {
    generation: u64,
    task: JoinHandle<()>,
}

// == TTL Scheduler ==
/// Tracks at most one live timer per key.
#[derive(Debug)]
pub struct TtlScheduler {
    timers: HashMap<String, TimerHandle>,
    next_generation: u64,
    runtime: Handle,
}

impl TtlScheduler {
    // == Constructor ==
    /// Creates a scheduler that spawns its timers on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            timers: HashMap::new(),
            next_generation: 0,
            runtime,
        }
    }

    // == Schedule ==
    /// Arms a timer for `key`, replacing any existing one.
    ///
    /// After `after` elapses `on_fire` is called once with the timer's
    /// [`Expiry`]. Returns the generation of the new timer.
    pub fn schedule<F, Fut>(&mut self, key: &str, after: Duration, on_fire: F) -> u64
    where
        F: FnOnce(Expiry) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel(key);

        self.next_generation += 1;
        let generation = self.next_generation;
        let deadline = Instant::now() + after;
        let expiry = Expiry {
            key: key.to_string(),
            generation,
        };

        let task = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            on_fire(expiry).await;
        });

        trace!(key, generation, ?after, "ttl timer armed");
        self.timers.insert(
            key.to_string(),
            TimerHandle { generation, task },
        );
        generation
    }

    // == Cancel ==
    /// Cancels the timer for `key`. Returns false if there was none.
    pub fn cancel(&mut self, key: &str) -> bool {
        match self.timers.remove(key) {
            Some(handle) => {
                handle.task.abort();
                trace!(key, generation = handle.generation, "ttl timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels every timer, returning how many were live.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        for (_, handle) in self.timers.drain() {
            handle.task.abort();
        }
        count
    }

    // == Claim ==
    /// Accepts a fired timer if it is still the live one for its key.
    ///
    /// On success the timer's bookkeeping is removed and the caller owns the
    /// expiration. Stale or cancelled generations return false.
    pub fn claim(&mut self, expiry: &Expiry) -> bool {
        match self.timers.get(&expiry.key) {
            Some(handle) if handle.generation == expiry.generation => {
                self.timers.remove(&expiry.key);
                true
            }
            _ => false,
        }
    }

    // == Queries ==
    #[cfg(test)]
    pub fn is_scheduled(&self, key: &str) -> bool {
        self.timers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Drop for TtlScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
