//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name string used in log fields (e.g. "list", "activate").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::List { .. } => "list",
        Commands::Activate { .. } => "activate",
        Commands::Sources { .. } => "sources",
    }
}
