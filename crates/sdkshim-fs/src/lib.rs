//! Filesystem primitives for sdkshim
//!
//! Provides lexical path handling and safe text I/O used by the config
//! resolver and the project-file patcher.

pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::JsonStore;
pub use error::{Error, Result};
pub use path::{NormalizedPath, simplify};
