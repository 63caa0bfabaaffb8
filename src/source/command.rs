//! Command-backed sources.
//!
//! A configured program prints a JSON array of records on stdout. Activation
//! runs a second program with the target passed through environment
//! variables, never spliced into a script. Exit status 0 means activated.

use crate::error::{ApiError, SourceError};
use crate::source::{FetchContext, Source, SourceKind};
use crate::types::{ItemKind, RawRecord, SourceId, UnifiedRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

pub const ENV_SELECTION: &str = "SWITCHBOARD_SELECTION";
pub const ENV_EXCLUDE: &str = "SWITCHBOARD_EXCLUDE";
pub const ENV_TITLE: &str = "SWITCHBOARD_TITLE";
pub const ENV_APP: &str = "SWITCHBOARD_APP";
pub const ENV_WINDOW: &str = "SWITCHBOARD_WINDOW";
pub const ENV_TAB: &str = "SWITCHBOARD_TAB";
pub const ENV_URL: &str = "SWITCHBOARD_URL";

/// Activation runs without an orchestrator-supplied bound, so it gets its own.
const DEFAULT_ACTIVATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration of one command-backed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default)]
    pub applications: Vec<String>,
    pub list_command: Vec<String>,
    #[serde(default)]
    pub activate_command: Option<Vec<String>>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Source id cannot be empty".to_string());
        }
        if self.list_command.first().map_or(true, |program| program.trim().is_empty()) {
            return Err("list_command must name a program".to_string());
        }
        if let Some(activate) = &self.activate_command {
            if activate.first().map_or(true, |program| program.trim().is_empty()) {
                return Err("activate_command must name a program".to_string());
            }
        }
        if self.kind == SourceKind::Dedicated && self.applications.is_empty() {
            return Err("Dedicated sources must list at least one application".to_string());
        }
        if self.timeout_ms == Some(0) {
            return Err("timeout_ms must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Record shape accepted on a source's stdout.
#[derive(Debug, Deserialize)]
struct WireRecord {
    title: String,
    #[serde(default, alias = "sourceLabel", alias = "app")]
    source_label: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, alias = "windowIndex")]
    window_index: Option<i64>,
    #[serde(default, alias = "tabIndex")]
    tab_index: Option<i64>,
    #[serde(default)]
    kind: Option<ItemKind>,
}

/// Parse a source's stdout into raw records.
///
/// Records without a `source_label` are attributed to `default_label`; when
/// there is no default either, the output is rejected as malformed.
pub fn parse_records(
    source_id: &SourceId,
    default_label: Option<&str>,
    stdout: &[u8],
) -> Result<Vec<RawRecord>, SourceError> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let wire: Vec<WireRecord> =
        serde_json::from_str(&text).map_err(|e| SourceError::MalformedOutput {
            source_id: source_id.clone(),
            message: e.to_string(),
        })?;

    wire.into_iter()
        .map(|record| {
            let source_label = record
                .source_label
                .filter(|label| !label.trim().is_empty())
                .or_else(|| default_label.map(str::to_string))
                .ok_or_else(|| SourceError::MalformedOutput {
                    source_id: source_id.clone(),
                    message: format!("record '{}' has no source_label", record.title),
                })?;
            Ok(RawRecord {
                title: record.title,
                source_label,
                url: record.url.filter(|url| !url.is_empty()),
                window_index: record.window_index,
                tab_index: record.tab_index,
                kind: record.kind.unwrap_or_default(),
            })
        })
        .collect()
}

/// Source backed by external programs.
#[derive(Debug, Clone)]
pub struct CommandSource {
    id: SourceId,
    kind: SourceKind,
    applications: Vec<String>,
    list_command: Vec<String>,
    activate_command: Option<Vec<String>>,
    timeout: Option<Duration>,
}

impl CommandSource {
    pub fn from_config(config: &SourceConfig) -> Result<Self, ApiError> {
        config
            .validate()
            .map_err(|e| ApiError::ConfigError(format!("Source '{}': {}", config.id, e)))?;
        Ok(Self {
            id: SourceId::new(config.id.trim()),
            kind: config.kind,
            applications: config.applications.clone(),
            list_command: config.list_command.clone(),
            activate_command: config.activate_command.clone(),
            timeout: config.timeout_ms.map(Duration::from_millis),
        })
    }

    fn build_command(argv: &[String]) -> Command {
        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Source for CommandSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn applications(&self) -> &[String] {
        &self.applications
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn fetch(&self, context: &FetchContext) -> Result<Vec<RawRecord>, SourceError> {
        let mut command = Self::build_command(&self.list_command);
        command
            .env(ENV_SELECTION, context.selection.normalized().join(","))
            .env(
                ENV_EXCLUDE,
                context.excluded.iter().cloned().collect::<Vec<_>>().join(","),
            );

        let output = command.output().await?;
        if !output.status.success() {
            return Err(SourceError::Failed {
                source_id: self.id.clone(),
                message: format!(
                    "{} exited with {}: {}",
                    self.list_command[0],
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let records = parse_records(
            &self.id,
            self.applications.first().map(String::as_str),
            &output.stdout,
        )?;
        debug!(source_id = %self.id, count = records.len(), "Command source listed records");
        Ok(records)
    }

    async fn activate(&self, record: &UnifiedRecord) -> bool {
        let Some(argv) = &self.activate_command else {
            debug!(source_id = %self.id, "Source has no activate_command");
            return false;
        };

        let mut command = Self::build_command(argv);
        command
            .env(ENV_TITLE, &record.title)
            .env(ENV_APP, &record.source_label)
            .env(ENV_WINDOW, record.window_position().to_string())
            .env(ENV_TAB, record.tab_position().to_string())
            .env(ENV_URL, record.url.as_deref().unwrap_or_default());

        let bound = self.timeout.unwrap_or(DEFAULT_ACTIVATION_TIMEOUT);
        match tokio::time::timeout(bound, command.output()).await {
            Ok(Ok(output)) => output.status.success(),
            Ok(Err(e)) => {
                warn!(source_id = %self.id, error = %e, "Failed to spawn activate_command");
                false
            }
            Err(_) => {
                warn!(source_id = %self.id, timeout_ms = bound.as_millis() as u64, "activate_command timed out");
                false
            }
        }
    }
}
