//! Project selection, settings merge and build-path bookkeeping
//!
//! Selection is purely lexical: stored paths are simplified when the
//! configuration is loaded, and a directory belongs to a project when it
//! starts with the project's path or with one of its recorded build paths.
//! The `*` entry is only consulted when no specific entry matches.

use std::path::Path;

use sdkshim_fs::{NormalizedPath, simplify};

use crate::model::{Config, Project, SharedSettings};

/// Path of the fallback project entry.
pub const WILDCARD: &str = "*";

/// Placeholder replaced by the selected project's SDK root.
pub const SDK_PATH_PLACEHOLDER: &str = "${sdkPath}";

/// Resolves effective per-project settings from a [`Config`].
///
/// The resolver never mutates the configuration it was built from; updates
/// produce a new [`Config`] that the caller decides whether to persist.
pub struct ProjectResolver<'a> {
    config: &'a Config,
}

impl<'a> ProjectResolver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Select the project owning `project_or_build_dir` and merge the global
    /// settings into a private copy of it.
    ///
    /// Returns `None` when neither a specific entry nor the wildcard
    /// matches.
    pub fn select(&self, project_or_build_dir: &str) -> Option<Project> {
        let selected = self
            .config
            .projects
            .iter()
            .filter(|p| !p.is_wildcard())
            .find(|p| owns(p, project_or_build_dir))
            .or_else(|| self.config.projects.iter().find(|p| p.is_wildcard()))?;

        tracing::debug!(
            dir = project_or_build_dir,
            project = %selected.path,
            sdk = %selected.sdk_path,
            "selected project"
        );
        Some(merge(&self.config.shared, selected))
    }

    /// Record `build_dir` for the project owning `project_dir`.
    ///
    /// Ownership is decided by `project_dir` prefix alone; build paths and
    /// the wildcard are not consulted, so the wildcard never accumulates
    /// build history. Returns the updated configuration, or `None` when
    /// nothing changed.
    pub fn update(&self, project_dir: &str, build_dir: &str) -> Option<Config> {
        self.update_with(project_dir, build_dir, |path| Path::new(path).exists())
    }

    /// Like [`ProjectResolver::update`] with a custom existence probe used
    /// to prune stale build paths.
    pub fn update_with<F>(&self, project_dir: &str, build_dir: &str, exists: F) -> Option<Config>
    where
        F: Fn(&str) -> bool,
    {
        let owner = self
            .config
            .projects
            .iter()
            .position(|p| !p.is_wildcard() && project_dir.starts_with(&p.path))?;

        if self.config.projects[owner].build_paths.contains(build_dir) {
            return None;
        }

        let mut next = self.config.clone();
        next.projects[owner].build_paths.insert(build_dir.to_string());

        for (idx, project) in next.projects.iter_mut().enumerate() {
            project.build_paths.retain(|path| {
                if path == build_dir {
                    // The directory now belongs to the owner alone.
                    return idx == owner;
                }
                let keep = exists(path);
                if !keep {
                    tracing::debug!(project = %project.path, build = %path, "pruning stale build path");
                }
                keep
            });
        }

        tracing::debug!(project = %next.projects[owner].path, build = build_dir, "recorded build path");
        Some(next)
    }
}

fn owns(project: &Project, dir: &str) -> bool {
    if dir.starts_with(&project.path) {
        return true;
    }
    project
        .build_paths
        .iter()
        .any(|build| !build.is_empty() && (dir == build || dir.starts_with(build.as_str())))
}

/// Merge global settings into a copy of `project`.
///
/// - compiler fixes: union
/// - extra include directories: globals first, then the project's
/// - environment: project entries plus any global entry not already present
/// - command replacements: project keys win; global keys are added when
///   absent, and every full-path key is also reachable by its bare file name
///
/// `${sdkPath}` in include directories and replacement arguments becomes
/// the SDK root followed by `/`, and the result is simplified.
pub fn merge(globals: &SharedSettings, project: &Project) -> Project {
    let sdk_dir_with_sep = format!("{}/", project.sdk_path);
    let expand = |value: &str| simplify(&value.replace(SDK_PATH_PLACEHOLDER, &sdk_dir_with_sep));

    let mut merged = project.clone();
    let shared = &mut merged.shared;

    shared
        .gcc_clang_fixes
        .extend(globals.gcc_clang_fixes.iter().cloned());

    shared.extra_add_directory = globals
        .extra_add_directory
        .iter()
        .chain(project.shared.extra_add_directory.iter())
        .map(|dir| expand(dir))
        .collect();

    shared
        .cmd_environment
        .extend(globals.cmd_environment.iter().cloned());

    for (key, value) in &globals.cmd_replacement {
        shared
            .cmd_replacement
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }

    for args in shared.cmd_replacement.values_mut() {
        for arg in args.iter_mut() {
            *arg = expand(arg);
        }
    }

    let bare_aliases: Vec<(String, Vec<String>)> = shared
        .cmd_replacement
        .iter()
        .filter_map(|(key, args)| {
            let bare = NormalizedPath::new(key).file_name()?.to_string();
            (!shared.cmd_replacement.contains_key(&bare)).then(|| (bare, args.clone()))
        })
        .collect();
    for (bare, args) in bare_aliases {
        shared.cmd_replacement.entry(bare).or_insert(args);
    }

    merged
}
