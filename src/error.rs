use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ArchiveError {
    #[error("{what} too long: {len} bytes (max {max})")]
    InputTooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Invalid archive name \"{name}\": {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("{tool} not found. Install it or set archive_tool in the config.")]
    ToolNotFound { tool: String },

    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed ({status}): {stderr}")]
    ExternalProcessFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Secret \"{name}\" is not available")]
    SecretUnavailable { name: String },

    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

pub(crate) type Result<T> = std::result::Result<T, ArchiveError>;
