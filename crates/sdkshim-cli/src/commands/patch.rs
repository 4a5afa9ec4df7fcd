//! Patch command implementation

use std::path::{Path, PathBuf};

use colored::Colorize;

use sdkshim_cbp::PatchStatus;
use sdkshim_config::ConfigStore;
use sdkshim_fs::{NormalizedPath, simplify};

use crate::batch::{self, PatchSettings};
use crate::error::{CliError, Result};
use crate::invocation::Invocation;
use crate::plan::Planner;

/// Patch project files generated into `build` with the SDK of the project
/// owning `project` (or `build` when no project directory is given).
///
/// Does not record the build directory in the configuration.
pub fn run_patch(build: &Path, project: Option<&Path>, files: &[PathBuf], dry_run: bool) -> Result<()> {
    let build_dir = simplify(&build.to_string_lossy());
    let project_dir = project
        .map(|p| simplify(&p.to_string_lossy()))
        .unwrap_or_default();

    let invocation = Invocation::capture(Vec::new());
    let store = ConfigStore::new();
    let (loaded, selected) = Planner::new(&store)
        .read_only()
        .resolve(&invocation, &project_dir, &build_dir)?;
    if selected.sdk_path.is_empty() {
        return Err(CliError::user(format!(
            "Project {} in {} has no sdkPath",
            selected.path, loaded.path
        )));
    }

    let settings = PatchSettings {
        build_dir: build_dir.clone(),
        sdk_dir: selected.sdk_path.clone(),
        extra_add_directory: selected.shared.extra_add_directory.clone(),
        gcc_clang_fixes: selected.shared.gcc_clang_fixes.clone(),
        config_path: loaded.path.to_string(),
    };

    let files: Vec<NormalizedPath> = if files.is_empty() {
        batch::discover(&[build_dir])
    } else {
        files.iter().map(NormalizedPath::simplified).collect()
    };
    if files.is_empty() {
        println!("{} No project files found.", "=>".blue().bold());
        return Ok(());
    }

    let report = batch::patch_all(&files, &settings, dry_run);
    for file in &report.files {
        if let Some(diff) = &file.diff {
            print!("{}", diff);
        }
    }
    for line in report.lines(&settings) {
        println!("{}", line);
    }

    let failed = report.count(PatchStatus::Error);
    if failed > 0 {
        return Err(CliError::user(format!("{} project file(s) could not be patched", failed)));
    }
    Ok(())
}
