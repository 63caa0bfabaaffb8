//! Configuration loading entry points.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::SwitchboardConfig;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_PREFIX: &str = "SWITCHBOARD";

/// Loads [`SwitchboardConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Layers, lowest precedence first: built-in defaults, the global config
    /// file, workspace files under `<workspace_root>/config/`, then
    /// `SWITCHBOARD_*` environment variables (`__` separates nested keys, e.g.
    /// `SWITCHBOARD_CACHE__DEFAULT_TTL_MS`).
    pub fn load(workspace_root: &Path) -> Result<SwitchboardConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: SwitchboardConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            sources = config.sources.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<SwitchboardConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    /// Location of the global config file.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
