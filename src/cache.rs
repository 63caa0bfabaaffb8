//! Stale-While-Revalidate Cache
//!
//! Single-slot cache: at most one selection's records are held at a time and
//! storing a different key evicts the previous entry. Entries are never
//! touched by failed refreshes, only replaced by successful ones.

use crate::capability::{CapabilityTable, Category};
use crate::clock::Clock;
use crate::selection::{Selection, SelectionKey};
use crate::types::UnifiedRecord;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared, immutable list of unified records.
pub type SharedRecords = Arc<Vec<UnifiedRecord>>;

pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// TTL derived from the categories named by a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    default_ttl: Duration,
    category_ttls: HashMap<Category, Duration>,
}

impl TtlPolicy {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            category_ttls: HashMap::new(),
        }
    }

    pub fn with_category(mut self, category: Category, ttl: Duration) -> Self {
        self.category_ttls.insert(category, ttl);
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn category_ttl(&self, category: Category) -> Duration {
        self.category_ttls
            .get(&category)
            .copied()
            .unwrap_or(self.default_ttl)
    }

    /// All-selection: the default TTL. Otherwise the shortest TTL among the
    /// selected applications' categories.
    pub fn ttl_for(&self, selection: &Selection, capabilities: &CapabilityTable) -> Duration {
        selection
            .normalized()
            .iter()
            .map(|name| self.category_ttl(capabilities.lookup(name).category))
            .min()
            .unwrap_or(self.default_ttl)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        TtlPolicy::new(DEFAULT_TTL)
            .with_category(Category::Browsers, Duration::from_secs(3))
            .with_category(Category::Terminals, Duration::from_secs(5))
            .with_category(Category::Editors, Duration::from_secs(15))
            .with_category(Category::Productivity, Duration::from_secs(30))
            .with_category(Category::System, Duration::from_secs(60))
            .with_category(Category::Universal, Duration::from_secs(10))
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: SelectionKey,
    pub records: SharedRecords,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        self.age(now) > self.ttl
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    Fresh(SharedRecords),
    /// Present but older than its TTL; serve it and refresh in the background.
    Stale(SharedRecords),
    Miss,
}

#[derive(Debug)]
pub struct SwrCache {
    slot: Mutex<Option<CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl SwrCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(None),
            clock,
        }
    }

    pub fn lookup(&self, key: &SelectionKey) -> Lookup {
        let slot = self.slot.lock();
        match slot.as_ref() {
            Some(entry) if entry.key == *key => {
                if entry.is_stale(self.clock.now()) {
                    Lookup::Stale(Arc::clone(&entry.records))
                } else {
                    Lookup::Fresh(Arc::clone(&entry.records))
                }
            }
            _ => Lookup::Miss,
        }
    }

    /// Replace the slot with a fresh entry for `key`.
    pub fn store(&self, key: SelectionKey, records: SharedRecords, ttl: Duration) {
        let entry = CacheEntry {
            key,
            records,
            fetched_at: self.clock.now(),
            ttl,
        };
        let mut slot = self.slot.lock();
        if let Some(previous) = slot.as_ref() {
            if previous.key != entry.key {
                debug!(evicted = %previous.key, stored = %entry.key, "Selection changed, evicting cache entry");
            }
        }
        *slot = Some(entry);
    }

    /// Drop the current entry. Returns true if there was one.
    pub fn invalidate(&self) -> bool {
        self.slot.lock().take().is_some()
    }

    pub fn current_key(&self) -> Option<SelectionKey> {
        self.slot.lock().as_ref().map(|entry| entry.key.clone())
    }

    pub fn entry(&self) -> Option<CacheEntry> {
        self.slot.lock().clone()
    }
}
