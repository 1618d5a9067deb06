//! Error types for binroute

use std::path::PathBuf;

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

/// Failures talking to the remote collaborator or local storage.
///
/// These are the only errors worth retrying.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Remote store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Report persistence / sharing failures
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write report to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render report: {0}")]
    Render(String),

    #[error("Share facility unavailable: {0}")]
    ShareUnavailable(String),
}

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input (missing checklist, empty skip reason, bad weight)
    #[error("Validation error: {0}")]
    Validation(String),

    /// State machine precondition violated
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// True when the caller may offer a retry instead of treating the input as wrong.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// True for errors caused by the caller's input or the current route state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Conflict(_) | Error::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
