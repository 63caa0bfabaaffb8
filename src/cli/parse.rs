//! CLI parse: clap types for Switchboard. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Switchboard CLI - unified inventory of open tabs, windows and documents
#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(about = "List and activate open tabs, windows and documents across applications")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (config/ is read from here)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Output format shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List open items, optionally restricted to some applications
    List {
        /// Application to include (repeatable; omit for all)
        #[arg(long = "app")]
        apps: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Bring a previously listed item to the foreground
    Activate {
        /// Application that owns the item
        #[arg(long)]
        app: String,

        /// Item title as last observed
        #[arg(long)]
        title: String,

        /// Item URL, when known
        #[arg(long)]
        url: Option<String>,

        /// 1-based window index as last observed
        #[arg(long, allow_negative_numbers = true)]
        window: Option<i64>,

        /// 1-based tab index as last observed
        #[arg(long, allow_negative_numbers = true)]
        tab: Option<i64>,

        /// Applications to re-fetch when resolving (repeatable; omit for all)
        #[arg(long = "selection")]
        selection: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show configured sources
    Sources {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
