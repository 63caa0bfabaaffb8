//! Source Orchestrator
//!
//! Fans a selection out to every applicable source at once, bounds each call
//! with its own timeout and turns any failure into an empty batch. Waits for
//! every source to settle before returning; callers never observe a partial
//! fan-out.

use crate::capability::CapabilityTable;
use crate::error::SourceError;
use crate::selection::Selection;
use crate::source::{FetchContext, Source, SourceKind};
use crate::types::{RawRecord, SourceId, UnifiedRecord};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Timeout applied to sources that do not declare their own.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Output of one source within a fan-out.
#[derive(Debug)]
pub struct SourceBatch {
    pub source_id: SourceId,
    pub kind: SourceKind,
    pub records: Vec<RawRecord>,
    /// Set when the source failed; `records` is then empty.
    pub error: Option<SourceError>,
}

impl SourceBatch {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// All batches of one fan-out, in source registration order.
#[derive(Debug, Default)]
pub struct FanOut {
    pub batches: Vec<SourceBatch>,
}

impl FanOut {
    /// True when at least one source ran and every one of them failed.
    pub fn all_failed(&self) -> bool {
        !self.batches.is_empty() && self.batches.iter().all(|batch| !batch.succeeded())
    }

    pub fn record_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.records.len()).sum()
    }
}

/// Descriptive view of a registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub id: String,
    pub kind: SourceKind,
    pub applications: Vec<String>,
    pub timeout_ms: u64,
}

pub struct SourceOrchestrator {
    sources: Vec<Arc<dyn Source>>,
    capabilities: Arc<CapabilityTable>,
    default_timeout: Duration,
}

impl SourceOrchestrator {
    pub fn new(
        sources: Vec<Arc<dyn Source>>,
        capabilities: Arc<CapabilityTable>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            sources,
            capabilities,
            default_timeout,
        }
    }

    pub fn sources(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    pub fn summaries(&self) -> Vec<SourceSummary> {
        self.sources
            .iter()
            .map(|source| SourceSummary {
                id: source.id().to_string(),
                kind: source.kind(),
                applications: source.applications().to_vec(),
                timeout_ms: self.timeout_for(source.as_ref()).as_millis() as u64,
            })
            .collect()
    }

    fn timeout_for(&self, source: &dyn Source) -> Duration {
        source.timeout().unwrap_or(self.default_timeout)
    }

    /// A universal source is always applicable; a dedicated one only when
    /// the selection is empty or names one of its applications (aliases included).
    pub fn is_applicable(&self, source: &dyn Source, selection: &Selection) -> bool {
        match source.kind() {
            SourceKind::Universal => true,
            SourceKind::Dedicated => selection.includes_any(source.applications(), &self.capabilities),
        }
    }

    pub fn applicable(&self, selection: &Selection) -> Vec<Arc<dyn Source>> {
        self.sources
            .iter()
            .filter(|source| self.is_applicable(source.as_ref(), selection))
            .cloned()
            .collect()
    }

    /// Build the fetch context: for an explicit selection, universal sources
    /// are told which applications a dedicated source already covers.
    fn fetch_context(&self, selection: &Selection, applicable: &[Arc<dyn Source>]) -> FetchContext {
        let mut context = FetchContext::new(selection.clone());
        if !selection.is_all() {
            let selected = selection.identities(&self.capabilities);
            context.excluded = applicable
                .iter()
                .filter(|source| source.kind() == SourceKind::Dedicated)
                .flat_map(|source| source.applications().iter())
                .map(|application| self.capabilities.canonical_identity(application))
                .filter(|identity| selected.contains(identity))
                .collect::<BTreeSet<_>>();
        }
        context
    }

    /// Query every applicable source concurrently.
    pub async fn fetch_all(&self, selection: &Selection) -> FanOut {
        let applicable = self.applicable(selection);
        let context = self.fetch_context(selection, &applicable);
        let started = Instant::now();

        let calls = applicable.iter().map(|source| {
            let context = &context;
            async move { self.fetch_one(source.as_ref(), context).await }
        });
        let batches = join_all(calls).await;

        let fan_out = FanOut { batches };
        debug!(
            selection = %selection.key(),
            sources = fan_out.batches.len(),
            records = fan_out.record_count(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Source fan-out settled"
        );
        fan_out
    }

    async fn fetch_one(&self, source: &dyn Source, context: &FetchContext) -> SourceBatch {
        let source_id = source.id().clone();
        let kind = source.kind();
        let timeout = self.timeout_for(source);

        let result = match tokio::time::timeout(timeout, source.fetch(context)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                source_id: source_id.clone(),
                after: timeout,
            }),
        };

        match result {
            Ok(records) => {
                let records = self.retain_selected(kind, records, context);
                SourceBatch {
                    source_id,
                    kind,
                    records,
                    error: None,
                }
            }
            Err(error) => {
                warn!(
                    source_id = %source_id,
                    error_kind = error.kind(),
                    error = %error,
                    "Source failed, contributing no records"
                );
                SourceBatch {
                    source_id,
                    kind,
                    records: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    /// Universal sources may see every application; keep only what the
    /// selection asked for and nothing a dedicated source already covers.
    /// The exclusion is enforced here whether or not the source honoured it.
    fn retain_selected(
        &self,
        kind: SourceKind,
        mut records: Vec<RawRecord>,
        context: &FetchContext,
    ) -> Vec<RawRecord> {
        if kind == SourceKind::Universal && !context.selection.is_all() {
            records.retain(|record| {
                context
                    .selection
                    .includes(&record.source_label, &self.capabilities)
                    && !context
                        .excluded
                        .contains(&self.capabilities.canonical_identity(&record.source_label))
            });
        }
        records
    }

    /// Source that should activate `record`: the one that observed it, else
    /// the dedicated owner of its application, else the first universal source.
    pub fn route(&self, record: &UnifiedRecord) -> Option<Arc<dyn Source>> {
        if let Some(source_id) = &record.source_id {
            if let Some(source) = self.sources.iter().find(|source| source.id() == source_id) {
                return Some(Arc::clone(source));
            }
        }

        let identity = self.capabilities.canonical_identity(&record.source_label);
        self.sources
            .iter()
            .find(|source| {
                source.kind() == SourceKind::Dedicated
                    && source
                        .applications()
                        .iter()
                        .any(|application| self.capabilities.canonical_identity(application) == identity)
            })
            .or_else(|| {
                self.sources
                    .iter()
                    .find(|source| source.kind() == SourceKind::Universal)
            })
            .cloned()
    }

    /// Activate through the routed source, bounded by that source's timeout.
    pub async fn activate(&self, record: &UnifiedRecord) -> bool {
        let Some(source) = self.route(record) else {
            debug!(app = %record.source_label, "No source can activate record");
            return false;
        };

        let timeout = self.timeout_for(source.as_ref());
        match tokio::time::timeout(timeout, source.activate(record)).await {
            Ok(activated) => activated,
            Err(_) => {
                warn!(
                    source_id = %source.id(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Activation timed out"
                );
                false
            }
        }
    }
}
