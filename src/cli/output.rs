//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;
use owo_colors::OwoColorize;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    format!("{} {}", "error:".red().bold(), e)
}

/// Process exit code for a failed command.
pub fn exit_code(e: &ApiError) -> i32 {
    match e {
        ApiError::ConfigError(_) | ApiError::LoggingError(_) => 2,
        _ => 1,
    }
}
