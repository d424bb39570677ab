//! Write Ordering Module
//!
//! Keeps write-through for a single key in the order the values were set.
//!
//! Every write registered for a key takes a sequence number. Before calling
//! the remote store a write must take that key's turn lock and still hold the
//! latest sequence number; anything older is dropped. A newer write that
//! arrives while an older one is on the wire waits for it, so the remote
//! always ends up with the last value set.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as TurnLock, OwnedMutexGuard};

#[derive(Debug)]
struct Slot {
    latest: u64,
    /// Tickets still alive for this key
    outstanding: usize,
    turn: Arc<TurnLock<()>>,
}

// == Write Order ==
/// Per-key sequencing for remote writes.
///
/// A key's slot lives only while it has outstanding tickets.
#[derive(Debug, Default)]
pub struct WriteOrder {
    slots: Mutex<HashMap<String, Slot>>,
}

impl WriteOrder {
    pub fn new() -> Self {
        Self::default()
    }

    // == Issue ==
    /// Registers a new write for `key`, making every older one stale.
    pub fn issue(self: &Arc<Self>, key: &str) -> WriteTicket {
        let mut slots = self.slots.lock();
        let slot = slots.entry(key.to_string()).or_insert_with(|| Slot {
            latest: 0,
            outstanding: 0,
            turn: Arc::new(TurnLock::new(())),
        });
        slot.latest += 1;
        slot.outstanding += 1;
        WriteTicket {
            order: Arc::clone(self),
            key: key.to_string(),
            seq: slot.latest,
        }
    }

    /// Makes outstanding writes for `key` stale without registering a new one.
    ///
    /// Used when a value is set while the remote link is down.
    pub fn supersede(&self, key: &str) {
        if let Some(slot) = self.slots.lock().get_mut(key) {
            slot.latest += 1;
        }
    }

    // == Begin ==
    /// Waits for the key's turn and returns it if `ticket` is still the
    /// latest write. Hold the returned guard across the remote call.
    pub async fn begin(&self, ticket: &WriteTicket) -> Option<OwnedMutexGuard<()>> {
        let turn = {
            let slots = self.slots.lock();
            Arc::clone(&slots.get(&ticket.key)?.turn)
        };
        let guard = turn.lock_owned().await;

        let slots = self.slots.lock();
        let current = slots.get(&ticket.key)?;
        (current.latest == ticket.seq).then_some(guard)
    }

    fn release(&self, key: &str) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(key) {
            slot.outstanding -= 1;
            if slot.outstanding == 0 {
                slots.remove(key);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_keys(&self) -> usize {
        self.slots.lock().len()
    }
}

// == Write Ticket ==
/// One registered write. Dropping it, whether the write ran or the value was
/// abandoned, releases the key's slot.
#[derive(Debug)]
pub struct WriteTicket {
    order: Arc<WriteOrder>,
    key: String,
    seq: u64,
}

impl WriteTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl Drop for WriteTicket {
    fn drop(&mut self) {
        self.order.release(&self.key);
    }
}
