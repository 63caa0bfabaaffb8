//! Error types for the switchboard inventory engine.
//!
//! Source failures never escape the core: the orchestrator degrades them to
//! empty batches. `ApiError` covers the ambient layers (configuration,
//! logging, CLI).

use crate::types::SourceId;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single source adapter call.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source {source_id} timed out after {after:?}")]
    Timeout { source_id: SourceId, after: Duration },

    #[error("Source {source_id} failed: {message}")]
    Failed { source_id: SourceId, message: String },

    #[error("Source {source_id} returned malformed output: {message}")]
    MalformedOutput { source_id: SourceId, message: String },

    #[error("Source I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Short classification used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Timeout { .. } => "timeout",
            SourceError::Failed { .. } => "error",
            SourceError::MalformedOutput { .. } => "malformed_output",
            SourceError::Io(_) => "io",
        }
    }
}

/// Errors surfaced by configuration, logging and the CLI layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Invalid activation target: {0}")]
    InvalidTarget(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
