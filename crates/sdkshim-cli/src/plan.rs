//! Turning an invocation into an execution plan
//!
//! Planning locates and loads the configuration, selects the project that
//! owns the invocation's directories, records a newly seen build directory,
//! and substitutes the configured replacement command. Nothing is executed
//! here.

use std::collections::BTreeSet;

use serde::Serialize;

use sdkshim_config::{ConfigStore, LoadedConfig, Project, ProjectResolver};
use sdkshim_fs::{NormalizedPath, simplify};

use crate::error::{CliError, Result};
use crate::invocation::Invocation;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "SDKSHIM_CONFIG";

/// What the wrapper will run, and what it patches afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    /// Program to start.
    pub exe_path: String,
    /// Rewritten command line; `args[0]` becomes the child's `argv[0]`.
    pub args: Vec<String>,
    /// Inherited environment followed by the configured additions.
    pub env: Vec<String>,
    pub pwd: String,
    pub home: String,
    pub config_path: String,
    /// Directories scanned for project files after a successful run.
    pub cbp_search_paths: Vec<String>,
    pub project_dir: String,
    pub build_dir: String,
    pub sdk_dir: String,
    pub extra_add_directory: Vec<String>,
    pub gcc_clang_fixes: BTreeSet<String>,
    /// Informational lines for the user.
    pub output: Vec<String>,
}

impl ExecutionPlan {
    /// Whether project files are patched after the run.
    pub fn patches_project_files(&self) -> bool {
        !self.cbp_search_paths.is_empty()
    }
}

/// Project and build directory of a project generator call.
///
/// A call is a generator call when the program's file name contains `make`,
/// the first argument is an existing path, and the working directory
/// already holds a `CMakeCache.txt` or has `build` in its path.
pub fn patch_target(invocation: &Invocation) -> Option<(String, String)> {
    let [program, source, ..] = invocation.args.as_slice() else {
        return None;
    };

    let program_name = NormalizedPath::new(program).file_name().unwrap_or_default().to_string();
    let pwd = NormalizedPath::new(&invocation.pwd);
    let is_generator = program_name.contains("make")
        && NormalizedPath::new(source).exists()
        && (pwd.join("CMakeCache.txt").exists() || invocation.pwd.contains("build"));

    is_generator.then(|| (simplify(source), simplify(&invocation.pwd)))
}

/// Whether `program` names a cmake binary.
fn is_cmake(program: &str) -> bool {
    NormalizedPath::new(program)
        .file_name()
        .is_some_and(|name| name.contains("cmake"))
}

/// Builds [`ExecutionPlan`]s against a [`ConfigStore`].
pub struct Planner<'a> {
    store: &'a ConfigStore,
    record_build_paths: bool,
}

impl<'a> Planner<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        Self {
            store,
            record_build_paths: true,
        }
    }

    /// Never write the configuration back, even when a new build
    /// directory was seen.
    pub fn read_only(mut self) -> Self {
        self.record_build_paths = false;
        self
    }

    /// Configuration files for the given directories, in search order.
    ///
    /// A file named by `SDKSHIM_CONFIG` in the invocation's environment
    /// comes first.
    pub fn config_candidates(
        &self,
        invocation: &Invocation,
        project_dir: &str,
        build_dir: &str,
    ) -> Vec<NormalizedPath> {
        let home = NormalizedPath::new(&invocation.home);
        let project = NormalizedPath::new(project_dir);
        let build = NormalizedPath::new(build_dir);
        let roots = ConfigStore::search_roots(Some(&home), Some(&project), Some(&build));

        let mut candidates = Vec::new();
        if let Some(explicit) = invocation.env_var(CONFIG_ENV).filter(|p| !p.is_empty()) {
            candidates.push(NormalizedPath::simplified(explicit));
        }
        for found in self.store.locate(&roots) {
            if !candidates.contains(&found) {
                candidates.push(found);
            }
        }
        candidates
    }

    /// Load the configuration and select the merged project for the
    /// directories, recording `build_dir` for its owner when allowed.
    pub fn resolve(
        &self,
        invocation: &Invocation,
        project_dir: &str,
        build_dir: &str,
    ) -> Result<(LoadedConfig, Project)> {
        let candidates = self.config_candidates(invocation, project_dir, build_dir);
        let mut loaded = self.store.load_first(&candidates)?;

        let selection_dir = if project_dir.is_empty() { build_dir } else { project_dir };
        let project = ProjectResolver::new(&loaded.config)
            .select(selection_dir)
            .ok_or_else(|| sdkshim_config::Error::ProjectNotMatched {
                dir: selection_dir.to_string(),
            })?;

        if self.record_build_paths {
            let updated = ProjectResolver::new(&loaded.config).update(project_dir, build_dir);
            self.store.commit(&mut loaded, updated);
        }

        Ok((loaded, project))
    }

    /// Plan the wrapped call described by `invocation`.
    pub fn plan(&self, invocation: &Invocation) -> Result<ExecutionPlan> {
        let Some(program) = invocation.args.first() else {
            return Err(CliError::user("No command to run"));
        };

        let target = patch_target(invocation);
        let (project_dir, build_dir) = target
            .clone()
            .unwrap_or_else(|| (String::new(), simplify(&invocation.pwd)));
        tracing::debug!(program = %program, project = %project_dir, build = %build_dir, patch = target.is_some(), "planning");

        let (loaded, project) = self.resolve(invocation, &project_dir, &build_dir)?;
        if project.sdk_path.is_empty() {
            return Err(CliError::user(format!(
                "Project {} in {} has no sdkPath",
                project.path, loaded.path
            )));
        }

        let file_name = NormalizedPath::new(program).file_name().unwrap_or_default().to_string();
        let replacement = project
            .shared
            .cmd_replacement
            .get(program)
            .or_else(|| project.shared.cmd_replacement.get(&file_name))
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                CliError::user(format!(
                    "No cmdReplacement for {} in {}",
                    program, loaded.path
                ))
            })?;

        let mut args = invocation.args.clone();
        for (arg, value) in args.iter_mut().zip(&replacement[1..]) {
            *arg = value.clone();
        }

        let mut env = invocation.env.clone();
        env.extend(project.shared.cmd_environment.iter().cloned());

        let mut plan = ExecutionPlan {
            exe_path: replacement[0].clone(),
            args,
            env,
            pwd: invocation.pwd.clone(),
            home: invocation.home.clone(),
            config_path: loaded.path.to_string(),
            cbp_search_paths: Vec::new(),
            project_dir,
            build_dir,
            sdk_dir: project.sdk_path.clone(),
            extra_add_directory: project.shared.extra_add_directory.clone(),
            gcc_clang_fixes: project.shared.gcc_clang_fixes.clone(),
            output: Vec::new(),
        };

        if target.is_some() {
            plan.cbp_search_paths.push(plan.build_dir.clone());
            plan.output.push(format!(
                "All *.cbp in {} will use {}",
                plan.build_dir, plan.sdk_dir
            ));
        } else if is_cmake(&plan.args[0]) {
            // Some IDEs probe for a cmake server; any output line stops that.
            plan.output.push("Running sdkshim...".to_string());
        }

        tracing::debug!(exe = %plan.exe_path, sdk = %plan.sdk_dir, config = %plan.config_path, "planned");
        Ok(plan)
    }
}
