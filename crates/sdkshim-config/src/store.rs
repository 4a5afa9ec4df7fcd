//! Configuration discovery, loading and persistence
//!
//! The configuration lives in a single `sdkshim.json`. Candidates are
//! searched in a fixed order and the first one that parses wins:
//!
//! 1. the home directory
//! 2. the project directory and each of its ancestors
//! 3. the build directory and each of its ancestors

use sdkshim_fs::{JsonStore, NormalizedPath};

use crate::model::Config;
use crate::{Error, Result};

/// File name searched for in every candidate directory.
pub const CONFIG_FILENAME: &str = "sdkshim.json";

/// A directory to look for the configuration file in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchRoot {
    /// Only the directory itself.
    Dir(NormalizedPath),
    /// The directory and every ancestor up to the filesystem root.
    DirAndAncestors(NormalizedPath),
}

impl SearchRoot {
    fn dirs(&self) -> Vec<NormalizedPath> {
        match self {
            SearchRoot::Dir(dir) => vec![dir.simplify()],
            SearchRoot::DirAndAncestors(dir) => dir.simplify().ancestors(),
        }
    }
}

/// A configuration together with the file it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub path: NormalizedPath,
    pub config: Config,
}

/// Loads and saves [`Config`] files.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    filename: String,
    json: JsonStore,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Create a store looking for [`CONFIG_FILENAME`].
    pub fn new() -> Self {
        Self::with_filename(CONFIG_FILENAME)
    }

    /// Create a store looking for a custom file name.
    pub fn with_filename(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            json: JsonStore::new(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Build the standard search order from the invocation's directories.
    ///
    /// Missing or empty directories are skipped.
    pub fn search_roots(
        home: Option<&NormalizedPath>,
        project_dir: Option<&NormalizedPath>,
        build_dir: Option<&NormalizedPath>,
    ) -> Vec<SearchRoot> {
        let non_empty = |p: Option<&NormalizedPath>| p.filter(|p| !p.as_str().is_empty()).cloned();

        let mut roots = Vec::new();
        if let Some(home) = non_empty(home) {
            roots.push(SearchRoot::Dir(home));
        }
        if let Some(project) = non_empty(project_dir) {
            roots.push(SearchRoot::DirAndAncestors(project));
        }
        if let Some(build) = non_empty(build_dir) {
            roots.push(SearchRoot::DirAndAncestors(build));
        }
        roots
    }

    /// List existing configuration files in search order, without
    /// duplicates.
    pub fn locate(&self, roots: &[SearchRoot]) -> Vec<NormalizedPath> {
        let mut found: Vec<NormalizedPath> = Vec::new();
        for dir in roots.iter().flat_map(SearchRoot::dirs) {
            let candidate = dir.join(&self.filename).simplify();
            if found.contains(&candidate) || !candidate.is_file() {
                continue;
            }
            tracing::debug!(path = %candidate, "found config candidate");
            found.push(candidate);
        }
        found
    }

    /// Parse a configuration file and normalize its paths.
    pub fn load(&self, path: &NormalizedPath) -> Result<Config> {
        let mut config: Config = self.json.load(path)?;
        config.normalize();
        Ok(config)
    }

    /// Load the first candidate that can be read and parsed.
    ///
    /// Unreadable or malformed candidates are logged and skipped.
    pub fn load_first(&self, candidates: &[NormalizedPath]) -> Result<LoadedConfig> {
        for path in candidates {
            match self.load(path) {
                Ok(config) => {
                    tracing::debug!(path = %path, projects = config.projects.len(), "loaded config");
                    return Ok(LoadedConfig {
                        path: path.clone(),
                        config,
                    });
                }
                Err(e) => tracing::warn!(path = %path, "skipping config: {}", e),
            }
        }

        Err(Error::ConfigNotFound {
            searched: candidates.iter().map(NormalizedPath::to_native).collect(),
        })
    }

    /// Write a configuration with two-space indentation.
    pub fn save(&self, path: &NormalizedPath, config: &Config) -> Result<()> {
        self.json.save(path, config)?;
        Ok(())
    }

    /// Render a configuration exactly as [`ConfigStore::save`] writes it.
    pub fn serialize(&self, config: &Config) -> Result<String> {
        Ok(self.json.render(&NormalizedPath::new(&self.filename), config)?)
    }

    /// Parse configuration text.
    pub fn deserialize(&self, content: &str) -> Result<Config> {
        Ok(self.json.parse(&NormalizedPath::new(&self.filename), content)?)
    }

    /// Persist `updated` over `loaded` when an update produced one.
    ///
    /// Returns whether the file was written. A failed write is logged and
    /// leaves `loaded` unchanged; it never aborts the caller.
    pub fn commit(&self, loaded: &mut LoadedConfig, updated: Option<Config>) -> bool {
        let Some(config) = updated else {
            return false;
        };

        match self.save(&loaded.path, &config) {
            Ok(()) => {
                tracing::debug!(path = %loaded.path, "saved updated config");
                loaded.config = config;
                true
            }
            Err(e) => {
                tracing::warn!(path = %loaded.path, "failed to save config: {}", e);
                false
            }
        }
    }
}
