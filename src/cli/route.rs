//! CLI route: single route table and run context. Dispatches to the
//! inventory service and presentation.

use crate::api::InventoryApi;
use crate::cli::help::command_name;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_activation_json, format_activation_text, format_items_json, format_items_text,
    format_sources_json, format_sources_text,
};
use crate::config::{ConfigLoader, SwitchboardConfig};
use crate::error::ApiError;
use crate::selection::Selection;
use crate::types::{RawRecord, UnifiedRecord};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Rendered command result. `success` drives the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

/// Activation target as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetArgs {
    pub app: String,
    pub title: String,
    pub url: Option<String>,
    pub window: Option<i64>,
    pub tab: Option<i64>,
}

/// Runtime context for CLI execution: workspace, config path and the
/// inventory service built from them.
pub struct RunContext {
    api: InventoryApi,
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = Self::load_config(&workspace_root, config_path.as_deref())?;
        let api = InventoryApi::from_config(&config)?;
        Ok(Self {
            api,
            workspace_root,
            config_path,
        })
    }

    /// Build a context around an existing service.
    pub fn with_api(api: InventoryApi, workspace_root: PathBuf) -> Self {
        Self {
            api,
            workspace_root,
            config_path: None,
        }
    }

    /// Load and validate configuration the way every command sees it.
    pub fn load_config(
        workspace_root: &Path,
        config_path: Option<&Path>,
    ) -> Result<SwitchboardConfig, ApiError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(workspace_root)?,
        };
        config.validated()
    }

    pub fn api(&self) -> &InventoryApi {
        &self.api
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command).await;
        info!(
            command = command_name(command),
            ok = result.as_ref().map_or(false, |output| output.success),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::List { apps, format } => Ok(self.handle_list(apps, *format).await),
            Commands::Activate {
                app,
                title,
                url,
                window,
                tab,
                selection,
                format,
            } => {
                let target = TargetArgs {
                    app: app.clone(),
                    title: title.clone(),
                    url: url.clone(),
                    window: *window,
                    tab: *tab,
                };
                self.handle_activate(&target, selection, *format).await
            }
            Commands::Sources { format } => Ok(self.handle_sources(*format)),
        }
    }

    async fn handle_list(&self, apps: &[String], format: OutputFormat) -> CommandOutput {
        let records = self.api.list_items(&Selection::of(apps.iter().cloned())).await;
        CommandOutput::ok(match format {
            OutputFormat::Text => format_items_text(&records),
            OutputFormat::Json => format_items_json(&records),
        })
    }

    async fn handle_activate(
        &self,
        target: &TargetArgs,
        selection: &[String],
        format: OutputFormat,
    ) -> Result<CommandOutput, ApiError> {
        if target.app.trim().is_empty() {
            return Err(ApiError::InvalidTarget("--app cannot be empty".to_string()));
        }

        let mut raw = RawRecord::new(target.title.clone(), target.app.clone());
        raw.url = target.url.clone().filter(|url| !url.is_empty());
        raw.window_index = target.window;
        raw.tab_index = target.tab;
        let record = UnifiedRecord::detached(raw, self.api.capabilities().lookup(&target.app));

        let selection = if selection.is_empty() {
            Selection::all()
        } else {
            Selection::of(selection.iter().cloned())
        };

        let outcome = self.api.activate_item_detailed(&record, &selection).await;
        let text = match format {
            OutputFormat::Text => format_activation_text(&record, &outcome),
            OutputFormat::Json => format_activation_json(&outcome),
        };
        Ok(CommandOutput {
            text,
            success: outcome.succeeded(),
        })
    }

    fn handle_sources(&self, format: OutputFormat) -> CommandOutput {
        let sources = self.api.sources();
        CommandOutput::ok(match format {
            OutputFormat::Text => format_sources_text(&sources),
            OutputFormat::Json => format_sources_json(&sources),
        })
    }
}
