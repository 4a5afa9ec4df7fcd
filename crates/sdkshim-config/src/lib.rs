//! SDK configuration for sdkshim
//!
//! A single JSON file (`sdkshim.json`) describes global defaults and a list
//! of projects, each bound to an SDK root. This crate finds and loads that
//! file, computes the effective settings for a directory, and records the
//! build directories a project has been generated into.

pub mod error;
pub mod model;
pub mod resolver;
pub mod store;

pub use error::{Error, Result};
pub use model::{Config, Project, SharedSettings};
pub use resolver::{ProjectResolver, SDK_PATH_PLACEHOLDER, WILDCARD};
pub use store::{CONFIG_FILENAME, ConfigStore, LoadedConfig, SearchRoot};
