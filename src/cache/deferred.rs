//! Deferred Value Module
//!
//! Single-assignment container for a value that may not be computed yet.
//! Lets the cache store "value now" and "value later" behind one type.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

type Callback<V> = Box<dyn FnOnce(&V) + Send + 'static>;

enum State<V> {
    /// Waiting for the resolver; callbacks in registration order
    Pending(Vec<Callback<V>>),
    /// Final value, immutable from here on
    Resolved(Arc<V>),
    /// Resolver dropped without resolving; will never complete
    Abandoned,
}

// == Deferred ==
/// Shared handle to a value that is either pending or resolved.
///
/// Clones share the same underlying state. A value moves from pending to
/// resolved at most once: the [`Resolver`] is consumed by
/// [`Resolver::resolve`], so a second resolution cannot be expressed.
pub struct Deferred<V> {
    state: Arc<Mutex<State<V>>>,
}

/// Capability to resolve exactly one [`Deferred`].
///
/// Dropping it unresolved abandons the value: queued callbacks are
/// discarded and [`Deferred::wait`] returns `None`.
pub struct Resolver<V> {
    state: Arc<Mutex<State<V>>>,
}

impl<V> Clone for Deferred<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<V> Deferred<V>
where
    V: Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates an already-resolved value.
    pub fn resolved(value: V) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Resolved(Arc::new(value)))),
        }
    }

    /// Creates a pending value together with its resolver.
    pub fn pending() -> (Self, Resolver<V>) {
        let state = Arc::new(Mutex::new(State::Pending(Vec::new())));
        let resolver = Resolver {
            state: Arc::clone(&state),
        };
        (Self { state }, resolver)
    }

    // == State ==
    /// Returns true once the value has been resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.lock(), State::Resolved(_))
    }

    // == On Complete ==
    /// Runs `callback` with the resolved value.
    ///
    /// Resolved: runs immediately on the caller's thread.
    /// Pending: queued and run by the resolver, after earlier registrations.
    /// Abandoned: dropped without running.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce(&V) + Send + 'static,
    {
        let value = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending(waiters) => {
                    waiters.push(Box::new(callback));
                    return;
                }
                State::Resolved(value) => Arc::clone(value),
                State::Abandoned => return,
            }
        };
        // Lock released: the callback may touch this Deferred again.
        callback(&value);
    }
}

impl<V> Deferred<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Returns a copy of the value if it has been resolved.
    pub fn value(&self) -> Option<V> {
        match &*self.state.lock() {
            State::Resolved(value) => Some(V::clone(value)),
            _ => None,
        }
    }

    /// Waits for resolution.
    ///
    /// Returns `None` if the resolver is dropped without resolving.
    pub async fn wait(&self) -> Option<V> {
        let (tx, rx) = oneshot::channel();
        self.on_complete(move |value: &V| {
            let _ = tx.send(value.clone());
        });
        rx.await.ok()
    }
}

impl<V> Resolver<V> {
    // == Resolve ==
    /// Resolves the value and runs every queued callback in registration order.
    pub fn resolve(self, value: V) {
        let value = Arc::new(value);
        let waiters = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, State::Resolved(Arc::clone(&value))) {
                State::Pending(waiters) => waiters,
                // Unreachable through the public API; keep the first value.
                previous => {
                    *state = previous;
                    return;
                }
            }
        };
        for callback in waiters {
            callback(&value);
        }
    }
}

impl<V> Drop for Resolver<V> {
    fn drop(&mut self) {
        let abandoned = {
            let mut state = self.state.lock();
            if matches!(*state, State::Pending(_)) {
                Some(std::mem::replace(&mut *state, State::Abandoned))
            } else {
                None
            }
        };
        // Waiters are dropped outside the lock so their destructors can't deadlock.
        drop(abandoned);
    }
}

impl<V: fmt::Debug> fmt::Debug for Deferred<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.lock() {
            State::Pending(waiters) => f
                .debug_struct("Deferred::Pending")
                .field("waiters", &waiters.len())
                .finish(),
            State::Resolved(value) => f.debug_tuple("Deferred::Resolved").field(value).finish(),
            State::Abandoned => f.write_str("Deferred::Abandoned"),
        }
    }
}

impl<V> fmt::Debug for Resolver<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver")
    }
}
