//! CLI domain: parse, route, help, output and presentation only.
//! No inventory logic; a single route table dispatches to the service.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_activation_json, format_activation_text, format_items_json, format_items_text,
    format_sources_json, format_sources_text,
};
pub use route::{CommandOutput, RunContext, TargetArgs};
