//! Source Adapter Abstraction
//!
//! Uniform interface over the things that can enumerate open items (browsers,
//! terminals, generic window lists). A source only has to enumerate and
//! activate; timeouts, failure isolation and merging are handled by the
//! orchestrator and reconciler.

use crate::error::SourceError;
use crate::selection::Selection;
use crate::types::{RawRecord, SourceId, UnifiedRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

pub mod command;

pub use command::CommandSource;

/// Dedicated sources own specific applications; universal sources can
/// enumerate any application and lose to a dedicated source on overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Dedicated,
    Universal,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Dedicated => "dedicated",
            SourceKind::Universal => "universal",
        }
    }
}

/// What a source is asked to enumerate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchContext {
    pub selection: Selection,
    /// Canonical identities already covered by a dedicated source in this
    /// fan-out. Universal sources should skip them.
    pub excluded: BTreeSet<String>,
}

impl FetchContext {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            excluded: BTreeSet::new(),
        }
    }
}

/// Enumeration and activation capability for one source.
#[async_trait]
pub trait Source: Send + Sync {
    fn id(&self) -> &SourceId;

    fn kind(&self) -> SourceKind;

    /// Applications owned by this source. Empty for universal sources.
    fn applications(&self) -> &[String];

    /// Per-source timeout; the orchestrator default applies when `None`.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Enumerate the items this source can see.
    async fn fetch(&self, context: &FetchContext) -> Result<Vec<RawRecord>, SourceError>;

    /// Bring `record` to the foreground. Any failure is reported as `false`.
    async fn activate(&self, record: &UnifiedRecord) -> bool;
}
