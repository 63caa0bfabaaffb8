//! In-flight Fetch Registry
//!
//! Coalesces concurrent refreshes: at most one refresh runs per selection
//! key, and every caller that asks for the same key while it runs receives
//! the same result. Holding a key's entry is the lock; settling removes the
//! entry and wakes all waiters, whatever the outcome.

use crate::cache::SharedRecords;
use crate::selection::SelectionKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Notify};
use tracing::debug;

/// Identifier of one underlying refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchId(u64);

impl FetchId {
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        FetchId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct InflightEntry {
    fetch_id: FetchId,
    waiters: Vec<oneshot::Sender<SharedRecords>>,
}

/// Receiving side for a refresh result. Resolves to an empty list if the
/// refresh was abandoned.
pub struct Pending(oneshot::Receiver<SharedRecords>);

impl Pending {
    pub async fn wait(self) -> SharedRecords {
        self.0.await.unwrap_or_default()
    }
}

/// Outcome of joining the registry for a key.
pub enum Join {
    /// No refresh was running; the caller must run it and settle the ticket.
    Leader(FetchTicket, Pending),
    /// A refresh is already running; wait for its result.
    Follower(Pending),
}

#[derive(Debug, Default)]
pub struct InflightRegistry {
    entries: Mutex<HashMap<SelectionKey, InflightEntry>>,
    /// Signalled whenever settling leaves the registry empty
    idle: Notify,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the refresh for `key`, starting one if needed.
    pub fn join(self: &Arc<Self>, key: &SelectionKey) -> Join {
        let (tx, rx) = oneshot::channel();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get_mut(key) {
            entry.waiters.push(tx);
            debug!(
                selection = %key,
                fetch_id = entry.fetch_id.as_u64(),
                waiters = entry.waiters.len(),
                "Joined in-flight refresh"
            );
            return Join::Follower(Pending(rx));
        }

        let fetch_id = FetchId::next();
        entries.insert(
            key.clone(),
            InflightEntry {
                fetch_id,
                waiters: vec![tx],
            },
        );
        Join::Leader(self.ticket(key, fetch_id), Pending(rx))
    }

    /// Start a refresh for `key` without waiting on it. Returns `None` when
    /// one is already running.
    pub fn begin(self: &Arc<Self>, key: &SelectionKey) -> Option<FetchTicket> {
        let mut entries = self.entries.lock();
        if entries.contains_key(key) {
            return None;
        }
        let fetch_id = FetchId::next();
        entries.insert(
            key.clone(),
            InflightEntry {
                fetch_id,
                waiters: Vec::new(),
            },
        );
        Some(self.ticket(key, fetch_id))
    }

    fn ticket(self: &Arc<Self>, key: &SelectionKey, fetch_id: FetchId) -> FetchTicket {
        FetchTicket {
            registry: Arc::clone(self),
            key: key.clone(),
            fetch_id,
            settled: false,
        }
    }

    pub fn is_in_flight(&self, key: &SelectionKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Resolve once no refresh is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a settle in between is not missed.
            notified.as_mut().enable();
            if self.is_empty() {
                return;
            }
            notified.await;
        }
    }

    /// Remove the entry for `key` and deliver `records` to its waiters.
    fn settle(&self, key: &SelectionKey, fetch_id: FetchId, records: SharedRecords) -> usize {
        let (waiters, idle) = {
            let mut entries = self.entries.lock();
            let waiters = match entries.get(key) {
                Some(entry) if entry.fetch_id == fetch_id => entries
                    .remove(key)
                    .map(|entry| entry.waiters)
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            (waiters, entries.is_empty())
        };

        let delivered = waiters.len();
        for tx in waiters {
            let _ = tx.send(Arc::clone(&records));
        }
        debug!(
            selection = %key,
            fetch_id = fetch_id.as_u64(),
            waiters = delivered,
            "Settled refresh"
        );
        if idle {
            self.idle.notify_waiters();
        }
        delivered
    }
}

/// Ownership of a running refresh. Dropping it unsettled releases the key
/// and hands waiters an empty list.
pub struct FetchTicket {
    registry: Arc<InflightRegistry>,
    key: SelectionKey,
    fetch_id: FetchId,
    settled: bool,
}

impl FetchTicket {
    pub fn key(&self) -> &SelectionKey {
        &self.key
    }

    pub fn fetch_id(&self) -> FetchId {
        self.fetch_id
    }

    /// Publish the result and release the key. Returns the number of waiters woken.
    pub fn complete(mut self, records: SharedRecords) -> usize {
        self.settled = true;
        self.registry.settle(&self.key, self.fetch_id, records)
    }
}

impl Drop for FetchTicket {
    fn drop(&mut self) {
        if !self.settled {
            self.registry
                .settle(&self.key, self.fetch_id, SharedRecords::default());
        }
    }
}
