//! Configuration data model
//!
//! Mirrors the on-disk JSON layout:
//!
//! ```text
//! {
//!   "cmdEnvironment": ["KEY=VAL", ...],
//!   "cmdReplacement": { "cmake": ["${sdkPath}/usr/bin/cmake", ...] },
//!   "gccClangFixes": ["-flag", ...],
//!   "extraAddDirectory": ["${sdkPath}/usr/include/extra", ...],
//!   "projects": [
//!     { ...the same four keys..., "path": "/work/app", "sdkPath": "/sdk/v42", "buildPaths": [...] }
//!   ]
//! }
//! ```
//!
//! Every key is optional and defaults to an empty container.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sdkshim_fs::simplify;

use crate::resolver::WILDCARD;

/// Settings that may appear both globally and on each project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedSettings {
    /// Environment additions as `KEY=VAL` strings.
    #[serde(default)]
    pub cmd_environment: BTreeSet<String>,

    /// Command name (bare or full path) to replacement argv prefix.
    ///
    /// The first element is the executable to run; the following elements
    /// overwrite the leading arguments of the original invocation.
    #[serde(default)]
    pub cmd_replacement: BTreeMap<String, Vec<String>>,

    /// Flags prepended to every compiler section of a patched project file.
    #[serde(default)]
    pub gcc_clang_fixes: BTreeSet<String>,

    /// Include directories appended to every compiler section.
    #[serde(default)]
    pub extra_add_directory: Vec<String>,
}

/// A project bound to an SDK root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(flatten)]
    pub shared: SharedSettings,

    /// Directory prefix that owns this project, or `*` for the fallback.
    #[serde(default)]
    pub path: String,

    /// Root of the SDK tree `/usr/...` paths are redirected into.
    #[serde(default)]
    pub sdk_path: String,

    /// Build directories this project has been generated into.
    #[serde(default)]
    pub build_paths: BTreeSet<String>,
}

impl Project {
    /// Create a project for `path` bound to `sdk_path`.
    pub fn new(path: impl Into<String>, sdk_path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sdk_path: sdk_path.into(),
            ..Default::default()
        }
    }

    /// Whether this is the `*` fallback entry.
    pub fn is_wildcard(&self) -> bool {
        self.path == WILDCARD
    }

    /// Simplify `path`, `sdk_path` and every build path in place.
    pub fn normalize(&mut self) {
        self.path = simplify(&self.path);
        self.sdk_path = simplify(&self.sdk_path);
        self.build_paths = self.build_paths.iter().map(|p| simplify(p)).collect();
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(flatten)]
    pub shared: SharedSettings,

    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Config {
    /// Canonicalize every stored path so later prefix checks are lexical.
    ///
    /// Relative entries are simplified but not made absolute; `*` is left
    /// untouched. A relative project path never prefixes the absolute
    /// directories passed to selection, so each one is reported.
    pub fn normalize(&mut self) {
        for project in &mut self.projects {
            project.normalize();
        }
        for project in self.relative_projects() {
            tracing::warn!(path = %project.path, "project path is not absolute and will never match");
        }
    }

    /// Entries whose `path` is neither absolute, empty nor `*`.
    pub fn relative_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| {
            !p.is_wildcard() && !p.path.is_empty() && !Path::new(&p.path).has_root()
        })
    }
}
