//! Selection Keys
//!
//! A selection is the caller's subset of applications; empty means all. The
//! cache key is built from the caller's literal names (trimmed, lower-cased,
//! sorted, de-duplicated). Aliases are only consulted for inclusion tests, so
//! `["chrome"]` and `["google chrome"]` select the same sources but produce
//! different keys.

use crate::capability::CapabilityTable;
use std::collections::BTreeSet;
use std::fmt;

const KEY_SEPARATOR: &str = ",";

/// Trim and lower-case an application name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Canonical cache key for a selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectionKey {
    /// Empty or absent selection.
    All,
    /// Sorted, normalized, non-empty application names.
    Applications(Vec<String>),
}

impl SelectionKey {
    pub fn is_all(&self) -> bool {
        matches!(self, SelectionKey::All)
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionKey::All => f.write_str("<all>"),
            SelectionKey::Applications(names) => f.write_str(&names.join(KEY_SEPARATOR)),
        }
    }
}

/// Caller-supplied set of application names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    names: Vec<String>,
}

impl Selection {
    /// Selection covering every application.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from an optional caller list; `None` selects everything.
    pub fn from_option(names: Option<&[String]>) -> Self {
        names.map(|names| Self::of(names.iter().cloned())).unwrap_or_default()
    }

    /// Names as the caller gave them.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Normalized names, sorted and de-duplicated, empties dropped.
    pub fn normalized(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .names
            .iter()
            .map(|name| normalize_name(name))
            .filter(|name| !name.is_empty())
            .collect();
        set.into_iter().collect()
    }

    pub fn key(&self) -> SelectionKey {
        let normalized = self.normalized();
        if normalized.is_empty() {
            SelectionKey::All
        } else {
            SelectionKey::Applications(normalized)
        }
    }

    pub fn is_all(&self) -> bool {
        self.normalized().is_empty()
    }

    /// Canonical identities (alias-resolved) of the selected applications.
    pub fn identities(&self, capabilities: &CapabilityTable) -> BTreeSet<String> {
        self.normalized()
            .iter()
            .map(|name| capabilities.canonical_identity(name))
            .collect()
    }

    /// True when `application` is covered by this selection.
    pub fn includes(&self, application: &str, capabilities: &CapabilityTable) -> bool {
        if self.is_all() {
            return true;
        }
        let identity = capabilities.canonical_identity(application);
        self.identities(capabilities).contains(&identity)
    }

    /// True when any of `applications` is covered by this selection.
    pub fn includes_any(&self, applications: &[String], capabilities: &CapabilityTable) -> bool {
        if self.is_all() {
            return true;
        }
        let identities = self.identities(capabilities);
        applications
            .iter()
            .any(|application| identities.contains(&capabilities.canonical_identity(application)))
    }
}
