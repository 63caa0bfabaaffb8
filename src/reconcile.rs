//! Reconciler / Deduplicator
//!
//! Merges per-source batches into one list. Two records are duplicates when
//! they share (application identity, title, window, tab), with missing
//! handles defaulting to 1. Dedicated batches are processed before universal
//! ones so first-seen-wins gives the dedicated record priority. Output order
//! is processing order; nothing is re-sorted.

use crate::capability::CapabilityTable;
use crate::orchestrator::SourceBatch;
use crate::source::SourceKind;
use crate::types::UnifiedRecord;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Identity under which records are considered duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub application: String,
    pub title: String,
    pub window: i64,
    pub tab: i64,
}

impl DedupKey {
    pub fn of(record: &UnifiedRecord, capabilities: &CapabilityTable) -> Self {
        Self {
            application: capabilities.canonical_identity(&record.source_label),
            title: record.title.clone(),
            window: record.window_position(),
            tab: record.tab_position(),
        }
    }
}

pub struct Reconciler {
    capabilities: Arc<CapabilityTable>,
}

impl Reconciler {
    pub fn new(capabilities: Arc<CapabilityTable>) -> Self {
        Self { capabilities }
    }

    /// Enrich and merge batches into a duplicate-free list.
    pub fn reconcile(&self, batches: Vec<SourceBatch>) -> Vec<UnifiedRecord> {
        let mut ordered = batches;
        // Stable: registration order is kept within each kind.
        ordered.sort_by_key(|batch| match batch.kind {
            SourceKind::Dedicated => 0,
            SourceKind::Universal => 1,
        });

        let enriched = ordered.into_iter().flat_map(|batch| {
            let source_id = batch.source_id;
            let capabilities = &self.capabilities;
            batch.records.into_iter().map(move |raw| {
                let profile = capabilities.lookup(&raw.source_label);
                UnifiedRecord::from_raw(raw, source_id.clone(), profile)
            })
        });

        self.dedupe(enriched)
    }

    /// First-seen-wins de-duplication, preserving input order.
    pub fn dedupe<I>(&self, records: I) -> Vec<UnifiedRecord>
    where
        I: IntoIterator<Item = UnifiedRecord>,
    {
        let mut seen = HashSet::new();
        let mut unified = Vec::new();
        let mut dropped = 0usize;
        for record in records {
            if seen.insert(DedupKey::of(&record, &self.capabilities)) {
                unified.push(record);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(kept = unified.len(), dropped, "Dropped duplicate records");
        }
        unified
    }
}
