//! Record types shared by sources, the reconciler and the cache.

use crate::capability::CapabilityProfile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an enumerated item is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Tab,
    Window,
    Document,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Tab => "tab",
            ItemKind::Window => "window",
            ItemKind::Document => "document",
        }
    }
}

/// Identifier of the source adapter that produced a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        SourceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        SourceId::new(id)
    }
}

/// Record as produced by a single source.
///
/// `window_index` and `tab_index` are 1-based positional handles that only
/// mean something inside the owning application. They are kept signed so a
/// malformed handle survives until activation validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,
    pub source_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_index: Option<i64>,
    #[serde(default)]
    pub kind: ItemKind,
}

impl RawRecord {
    pub fn new(title: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_label: source_label.into(),
            url: None,
            window_index: None,
            tab_index: None,
            kind: ItemKind::default(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn at(mut self, window_index: i64, tab_index: i64) -> Self {
        self.window_index = Some(window_index);
        self.tab_index = Some(tab_index);
        self
    }

    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A raw record enriched with its capability profile. Immutable once cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub title: String,
    pub source_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_index: Option<i64>,
    #[serde(default)]
    pub kind: ItemKind,
    /// Source that observed the record. Hand-built activation targets may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<SourceId>,
    #[serde(default)]
    pub capability: CapabilityProfile,
}

impl UnifiedRecord {
    pub fn from_raw(raw: RawRecord, source_id: SourceId, capability: CapabilityProfile) -> Self {
        Self {
            title: raw.title,
            source_label: raw.source_label,
            url: raw.url,
            window_index: raw.window_index,
            tab_index: raw.tab_index,
            kind: raw.kind,
            source_id: Some(source_id),
            capability,
        }
    }

    /// Build an activation target that was not observed through a source.
    pub fn detached(raw: RawRecord, capability: CapabilityProfile) -> Self {
        Self {
            title: raw.title,
            source_label: raw.source_label,
            url: raw.url,
            window_index: raw.window_index,
            tab_index: raw.tab_index,
            kind: raw.kind,
            source_id: None,
            capability,
        }
    }

    /// Window handle, defaulting to 1 when absent.
    pub fn window_position(&self) -> i64 {
        self.window_index.unwrap_or(1)
    }

    /// Tab handle, defaulting to 1 when absent.
    pub fn tab_position(&self) -> i64 {
        self.tab_index.unwrap_or(1)
    }
}
