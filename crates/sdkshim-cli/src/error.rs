//! Error types for sdkshim-cli

use std::path::PathBuf;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] sdkshim_config::Error),

    #[error(transparent)]
    Cbp(#[from] sdkshim_cbp::Error),

    #[error(transparent)]
    Fs(#[from] sdkshim_fs::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode execution plan: {0}")]
    Json(#[from] serde_json::Error),

    /// The replacement executable could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
