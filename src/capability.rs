//! Capability Profiles
//!
//! Static per-application metadata: category and supported item kinds. The
//! table also owns the alias map used to resolve short names ("chrome") to a
//! canonical application identity ("google chrome"). Lookup is a pure, total
//! function: unknown applications get the universal profile.

use crate::selection::normalize_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Application category. Drives TTL and adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Browsers,
    Terminals,
    Editors,
    Productivity,
    System,
    Universal,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Browsers,
        Category::Terminals,
        Category::Editors,
        Category::Productivity,
        Category::System,
        Category::Universal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Browsers => "browsers",
            Category::Terminals => "terminals",
            Category::Editors => "editors",
            Category::Productivity => "productivity",
            Category::System => "system",
            Category::Universal => "universal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = normalize_name(s);
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == folded)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityProfile {
    pub category: Category,
    #[serde(default)]
    pub supports_tabs: bool,
    #[serde(default)]
    pub supports_documents: bool,
    #[serde(default)]
    pub supports_paths: bool,
}

impl CapabilityProfile {
    pub const UNIVERSAL: CapabilityProfile = CapabilityProfile::new(Category::Universal, false, false, false);

    pub const fn new(
        category: Category,
        supports_tabs: bool,
        supports_documents: bool,
        supports_paths: bool,
    ) -> Self {
        Self {
            category,
            supports_tabs,
            supports_documents,
            supports_paths,
        }
    }
}

impl Default for CapabilityProfile {
    fn default() -> Self {
        CapabilityProfile::UNIVERSAL
    }
}

const BROWSER: CapabilityProfile = CapabilityProfile::new(Category::Browsers, true, false, false);
const TABBED_TERMINAL: CapabilityProfile = CapabilityProfile::new(Category::Terminals, true, false, true);
const TERMINAL: CapabilityProfile = CapabilityProfile::new(Category::Terminals, false, false, true);
const EDITOR: CapabilityProfile = CapabilityProfile::new(Category::Editors, true, true, true);
const OFFICE: CapabilityProfile = CapabilityProfile::new(Category::Productivity, false, true, true);

const BUILTIN_PROFILES: &[(&str, CapabilityProfile)] = &[
    ("Safari", BROWSER),
    ("Google Chrome", BROWSER),
    ("Firefox", BROWSER),
    ("Arc", BROWSER),
    ("Brave Browser", BROWSER),
    ("Microsoft Edge", BROWSER),
    ("Opera", BROWSER),
    ("Vivaldi", BROWSER),
    ("Terminal", TABBED_TERMINAL),
    ("iTerm2", TABBED_TERMINAL),
    ("Warp", TABBED_TERMINAL),
    ("kitty", TABBED_TERMINAL),
    ("Alacritty", TERMINAL),
    ("Visual Studio Code", EDITOR),
    ("Cursor", EDITOR),
    ("Zed", EDITOR),
    ("Sublime Text", EDITOR),
    ("Xcode", EDITOR),
    ("Microsoft Word", OFFICE),
    ("Microsoft Excel", OFFICE),
    ("Microsoft PowerPoint", OFFICE),
    ("Pages", OFFICE),
    ("Numbers", OFFICE),
    ("Keynote", OFFICE),
    ("Preview", OFFICE),
    ("Finder", CapabilityProfile::new(Category::System, true, false, true)),
    ("System Settings", CapabilityProfile::new(Category::System, false, false, false)),
];

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("chrome", "Google Chrome"),
    ("brave", "Brave Browser"),
    ("edge", "Microsoft Edge"),
    ("iterm", "iTerm2"),
    ("code", "Visual Studio Code"),
    ("vscode", "Visual Studio Code"),
    ("sublime", "Sublime Text"),
    ("word", "Microsoft Word"),
    ("excel", "Microsoft Excel"),
    ("powerpoint", "Microsoft PowerPoint"),
];

/// Capability and alias lookup table, keyed by normalized application name.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    profiles: HashMap<String, CapabilityProfile>,
    aliases: HashMap<String, String>,
}

impl CapabilityTable {
    /// Empty table: every application resolves to the universal profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with the well-known applications and short-name aliases.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (name, profile) in BUILTIN_PROFILES {
            table.register(name, *profile);
        }
        for (alias, canonical) in BUILTIN_ALIASES {
            table.add_alias(alias, canonical);
        }
        table
    }

    /// Register or replace the profile of an application.
    pub fn register(&mut self, application: &str, profile: CapabilityProfile) {
        self.profiles.insert(normalize_name(application), profile);
    }

    /// Map `alias` onto the canonical identity of `canonical`.
    pub fn add_alias(&mut self, alias: &str, canonical: &str) {
        let alias = normalize_name(alias);
        let canonical = normalize_name(canonical);
        if alias.is_empty() || canonical.is_empty() || alias == canonical {
            return;
        }
        self.aliases.insert(alias, canonical);
    }

    /// Canonical identity of an application name: normalized, alias-resolved.
    pub fn canonical_identity(&self, application: &str) -> String {
        let folded = normalize_name(application);
        match self.aliases.get(&folded) {
            Some(canonical) => canonical.clone(),
            None => folded,
        }
    }

    /// True when both names resolve to the same application.
    pub fn same_application(&self, left: &str, right: &str) -> bool {
        self.canonical_identity(left) == self.canonical_identity(right)
    }

    pub fn lookup(&self, application: &str) -> CapabilityProfile {
        self.profiles
            .get(&self.canonical_identity(application))
            .copied()
            .unwrap_or(CapabilityProfile::UNIVERSAL)
    }

    /// Aliases that resolve to the given application, in sorted order.
    pub fn aliases_of(&self, application: &str) -> Vec<String> {
        let canonical = self.canonical_identity(application);
        let mut aliases: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, target)| **target == canonical)
            .map(|(alias, _)| alias.clone())
            .collect();
        aliases.sort();
        aliases
    }
}
