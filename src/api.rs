//! Inventory API
//!
//! Service object owning the cache slot, TTL policy, in-flight registry and
//! sources. Constructed once per process and shared by cloning; clones share
//! all state. Public operations never fail: problems surface as empty lists
//! or `false`, with detail in the logs.

use crate::activation::{ActivationOutcome, ActivationResolver};
use crate::cache::{Lookup, SharedRecords, SwrCache, TtlPolicy};
use crate::capability::CapabilityTable;
use crate::clock::{Clock, SystemClock};
use crate::config::SwitchboardConfig;
use crate::error::ApiError;
use crate::inflight::{FetchTicket, InflightRegistry, Join};
use crate::orchestrator::{SourceOrchestrator, SourceSummary, DEFAULT_SOURCE_TIMEOUT};
use crate::reconcile::Reconciler;
use crate::selection::{Selection, SelectionKey};
use crate::source::{CommandSource, Source};
use crate::types::UnifiedRecord;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Counters describing how requests were served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryStats {
    /// Served from a fresh cache entry
    pub hits: usize,
    /// Served from a stale entry while refreshing in the background
    pub stale_hits: usize,
    /// No entry for the key; caller waited for a refresh
    pub misses: usize,
    /// Underlying fan-outs started by the cache path
    pub refreshes: usize,
    /// Callers that joined a refresh already in flight
    pub coalesced: usize,
    /// Refreshes where every applicable source failed
    pub refresh_failures: usize,
    pub activations: usize,
    pub activations_succeeded: usize,
    /// Successes that needed the resolve-and-retry path
    pub activations_resolved: usize,
}

/// Builder for [`InventoryApi`].
pub struct InventoryBuilder {
    sources: Vec<Arc<dyn Source>>,
    capabilities: CapabilityTable,
    ttl: TtlPolicy,
    clock: Arc<dyn Clock>,
    default_timeout: Duration,
}

impl InventoryBuilder {
    fn new() -> Self {
        Self {
            sources: Vec::new(),
            capabilities: CapabilityTable::builtin(),
            ttl: TtlPolicy::default(),
            clock: Arc::new(SystemClock),
            default_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn source(mut self, source: Arc<dyn Source>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn capabilities(mut self, capabilities: CapabilityTable) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn ttl_policy(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn build(self) -> InventoryApi {
        let capabilities = Arc::new(self.capabilities);
        let inner = Inner {
            orchestrator: SourceOrchestrator::new(
                self.sources,
                Arc::clone(&capabilities),
                self.default_timeout,
            ),
            reconciler: Reconciler::new(Arc::clone(&capabilities)),
            cache: SwrCache::new(self.clock),
            capabilities,
            ttl: self.ttl,
            inflight: Arc::new(InflightRegistry::new()),
            stats: RwLock::new(InventoryStats::default()),
        };
        InventoryApi {
            inner: Arc::new(inner),
        }
    }
}

struct Inner {
    orchestrator: SourceOrchestrator,
    reconciler: Reconciler,
    capabilities: Arc<CapabilityTable>,
    cache: SwrCache,
    ttl: TtlPolicy,
    inflight: Arc<InflightRegistry>,
    stats: RwLock<InventoryStats>,
}

impl Inner {
    /// Fan out, reconcile and publish to the cache. A refresh where every
    /// source failed returns an empty list and leaves the cache untouched.
    async fn run_refresh(&self, selection: &Selection, key: &SelectionKey) -> SharedRecords {
        let started = Instant::now();
        self.stats.write().refreshes += 1;

        let fan_out = self.orchestrator.fetch_all(selection).await;
        if fan_out.all_failed() {
            self.stats.write().refresh_failures += 1;
            warn!(
                selection = %key,
                sources = fan_out.batches.len(),
                "Every source failed; keeping previous cache entry"
            );
            return SharedRecords::default();
        }

        let records: SharedRecords = Arc::new(self.reconciler.reconcile(fan_out.batches));
        let ttl = self.ttl.ttl_for(selection, &self.capabilities);
        self.cache.store(key.clone(), Arc::clone(&records), ttl);
        debug!(
            selection = %key,
            records = records.len(),
            ttl_ms = ttl.as_millis() as u64,
            duration_ms = started.elapsed().as_millis() as u64,
            "Refresh completed"
        );
        records
    }
}

/// Unified inventory of open items.
#[derive(Clone)]
pub struct InventoryApi {
    inner: Arc<Inner>,
}

impl InventoryApi {
    pub fn builder() -> InventoryBuilder {
        InventoryBuilder::new()
    }

    /// Build from configuration: capability overrides, aliases, TTLs and
    /// command-backed sources.
    pub fn from_config(config: &SwitchboardConfig) -> Result<Self, ApiError> {
        let mut builder = Self::builder()
            .capabilities(config.capability_table())
            .ttl_policy(config.cache.ttl_policy()?)
            .default_timeout(Duration::from_millis(config.orchestrator.default_timeout_ms));

        for source_config in &config.sources {
            let source = CommandSource::from_config(source_config)?;
            builder = builder.source(Arc::new(source));
        }

        Ok(builder.build())
    }

    /// Current best-effort view for `selection`.
    ///
    /// Fresh entry: returned as is. Stale entry: returned immediately and a
    /// background refresh is started unless one is running. No entry: waits
    /// for a (possibly shared) refresh.
    pub async fn list_items(&self, selection: &Selection) -> SharedRecords {
        let key = selection.key();
        match self.inner.cache.lookup(&key) {
            Lookup::Fresh(records) => {
                self.inner.stats.write().hits += 1;
                debug!(selection = %key, records = records.len(), "Cache hit");
                records
            }
            Lookup::Stale(records) => {
                self.inner.stats.write().stale_hits += 1;
                debug!(selection = %key, records = records.len(), "Serving stale entry");
                self.refresh_in_background(selection, &key);
                records
            }
            Lookup::Miss => {
                self.inner.stats.write().misses += 1;
                debug!(selection = %key, "Cache miss");
                self.refresh(selection, &key).await
            }
        }
    }

    async fn refresh(&self, selection: &Selection, key: &SelectionKey) -> SharedRecords {
        let pending = match self.inner.inflight.join(key) {
            Join::Leader(ticket, pending) => {
                self.spawn_refresh(selection.clone(), ticket);
                pending
            }
            Join::Follower(pending) => {
                self.inner.stats.write().coalesced += 1;
                pending
            }
        };
        pending.wait().await
    }

    fn refresh_in_background(&self, selection: &Selection, key: &SelectionKey) {
        match self.inner.inflight.begin(key) {
            Some(ticket) => self.spawn_refresh(selection.clone(), ticket),
            None => debug!(selection = %key, "Refresh already in flight"),
        }
    }

    /// Run the refresh on its own task so it completes even if every caller
    /// waiting on it goes away.
    fn spawn_refresh(&self, selection: Selection, ticket: FetchTicket) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let records = inner.run_refresh(&selection, ticket.key()).await;
            ticket.complete(records);
        });
    }

    /// Activate a previously observed item, resolving shifted handles.
    pub async fn activate_item(&self, target: &UnifiedRecord, selection: &Selection) -> bool {
        self.activate_item_detailed(target, selection)
            .await
            .succeeded()
    }

    /// Like [`activate_item`](Self::activate_item) but reports how it ended.
    pub async fn activate_item_detailed(
        &self,
        target: &UnifiedRecord,
        selection: &Selection,
    ) -> ActivationOutcome {
        let inner = &self.inner;
        let resolver = ActivationResolver::new(
            &inner.orchestrator,
            &inner.reconciler,
            &inner.capabilities,
            &inner.cache,
        );
        let outcome = resolver.activate(target, selection).await;

        let mut stats = inner.stats.write();
        stats.activations += 1;
        match &outcome {
            ActivationOutcome::Direct => stats.activations_succeeded += 1,
            ActivationOutcome::Resolved { criterion, .. } => {
                stats.activations_succeeded += 1;
                stats.activations_resolved += 1;
                info!(title = %target.title, criterion = %criterion, "Activated after resolving");
            }
            _ => {}
        }
        outcome
    }

    /// Drop the cached entry. In-flight refreshes still complete and may
    /// repopulate it.
    pub fn invalidate(&self) {
        if self.inner.cache.invalidate() {
            debug!("Cache invalidated");
        }
    }

    /// Wait until no refresh is in flight. Returns false on timeout.
    pub async fn wait_for_refreshes(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.inner.inflight.wait_idle())
            .await
            .is_ok()
    }

    pub fn stats(&self) -> InventoryStats {
        self.inner.stats.read().clone()
    }

    pub fn sources(&self) -> Vec<SourceSummary> {
        self.inner.orchestrator.summaries()
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.inner.capabilities
    }

    /// Key currently held by the cache slot, if any.
    pub fn cached_key(&self) -> Option<SelectionKey> {
        self.inner.cache.current_key()
    }
}
