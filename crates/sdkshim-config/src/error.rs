//! Error types for sdkshim-config

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] sdkshim_fs::Error),

    #[error("No readable configuration found ({} candidates searched)", .searched.len())]
    ConfigNotFound { searched: Vec<PathBuf> },

    #[error("No configured project matches {dir}")]
    ProjectNotMatched { dir: String },
}
