//! Configuration System
//!
//! Hierarchical configuration: built-in defaults, a global file, workspace
//! files and environment overrides, validated before use. Describes the
//! cache TTLs, the orchestrator timeout, capability and alias overrides, the
//! command-backed sources and logging.

use crate::cache::TtlPolicy;
use crate::capability::{CapabilityProfile, CapabilityTable, Category};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::time::Duration;

pub use crate::source::command::SourceConfig;

mod facade;
mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod global_file;
    pub mod workspace_file;
}

pub use facade::{ConfigLoader, ENV_PREFIX};
pub use sources::workspace_file::ENV_PROFILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchboardConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Extra short-name aliases: alias -> canonical application name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Capability overrides keyed by application name
    #[serde(default)]
    pub capabilities: BTreeMap<String, CapabilityProfile>,

    /// Command-backed sources, in registration order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cache TTL settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for the all-applications selection
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    /// TTL per category name (browsers, terminals, ...)
    #[serde(default = "default_category_ttls")]
    pub category_ttl_ms: BTreeMap<String, u64>,
}

fn default_ttl_ms() -> u64 {
    crate::cache::DEFAULT_TTL.as_millis() as u64
}

pub(crate) fn default_category_ttl_ms(category: Category) -> u64 {
    TtlPolicy::default().category_ttl(category).as_millis() as u64
}

fn default_category_ttls() -> BTreeMap<String, u64> {
    Category::ALL
        .into_iter()
        .map(|category| (category.as_str().to_string(), default_category_ttl_ms(category)))
        .collect()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: default_ttl_ms(),
            category_ttl_ms: default_category_ttls(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.default_ttl_ms == 0 {
            return Err("default_ttl_ms must be greater than zero".to_string());
        }
        for (name, ttl) in &self.category_ttl_ms {
            Category::from_str(name)?;
            if *ttl == 0 {
                return Err(format!("TTL for category '{}' must be greater than zero", name));
            }
        }
        Ok(())
    }

    pub fn ttl_policy(&self) -> Result<TtlPolicy, ApiError> {
        let mut policy = TtlPolicy::new(Duration::from_millis(self.default_ttl_ms));
        for (name, ttl) in &self.category_ttl_ms {
            let category = Category::from_str(name).map_err(ApiError::ConfigError)?;
            policy = policy.with_category(category, Duration::from_millis(*ttl));
        }
        Ok(policy)
    }
}

/// Fan-out settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Timeout for sources that do not set their own
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    crate::orchestrator::DEFAULT_SOURCE_TIMEOUT.as_millis() as u64
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Cache(String),
    Orchestrator(String),
    Alias(String, String),
    Capability(String, String),
    Source(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Cache(msg) => write!(f, "Cache: {}", msg),
            ValidationError::Orchestrator(msg) => write!(f, "Orchestrator: {}", msg),
            ValidationError::Alias(name, msg) => write!(f, "Alias '{}': {}", name, msg),
            ValidationError::Capability(name, msg) => {
                write!(f, "Capability '{}': {}", name, msg)
            }
            ValidationError::Source(name, msg) => write!(f, "Source '{}': {}", name, msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SwitchboardConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.cache.validate() {
            errors.push(ValidationError::Cache(e));
        }
        if self.orchestrator.default_timeout_ms == 0 {
            errors.push(ValidationError::Orchestrator(
                "default_timeout_ms must be greater than zero".to_string(),
            ));
        }

        for (alias, canonical) in &self.aliases {
            if alias.trim().is_empty() || canonical.trim().is_empty() {
                errors.push(ValidationError::Alias(
                    alias.clone(),
                    "alias and target must both be non-empty".to_string(),
                ));
            }
        }

        for name in self.capabilities.keys() {
            if name.trim().is_empty() {
                errors.push(ValidationError::Capability(
                    name.clone(),
                    "application name cannot be empty".to_string(),
                ));
            }
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (position, source) in self.sources.iter().enumerate() {
            if let Err(e) = source.validate() {
                errors.push(ValidationError::Source(source.id.clone(), e));
            }
            if let Some(first) = seen.insert(source.id.trim(), position) {
                errors.push(ValidationError::Source(
                    source.id.clone(),
                    format!("Duplicate source id (also defined at position {})", first),
                ));
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every error into a single `ApiError`.
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }

    /// Built-in capability table with this configuration's overrides applied.
    pub fn capability_table(&self) -> CapabilityTable {
        let mut table = CapabilityTable::builtin();
        for (application, profile) in &self.capabilities {
            table.register(application, *profile);
        }
        for (alias, canonical) in &self.aliases {
            table.add_alias(alias, canonical);
        }
        table
    }
}
