//! Wrapper mode: plan, run, then patch

use sdkshim_config::ConfigStore;

use crate::batch::{self, PatchSettings};
use crate::error::Result;
use crate::exec;
use crate::invocation::Invocation;
use crate::plan::Planner;

/// Run `args` through its SDK replacement and patch the project files it
/// generated.
///
/// Returns the exit code to leave with: the child's code, or zero after a
/// successful run even when some project files failed to patch.
pub fn run_wrapped(args: Vec<String>) -> Result<i32> {
    let invocation = Invocation::capture(args);
    let store = ConfigStore::new();
    let plan = Planner::new(&store).plan(&invocation)?;

    for line in &plan.output {
        println!("{}", line);
    }

    let code = exec::run(&plan)?;
    if code != 0 {
        tracing::warn!(code, exe = %plan.exe_path, "wrapped command failed, skipping project files");
        return Ok(code);
    }

    if plan.patches_project_files() {
        let settings = PatchSettings::from(&plan);
        let files = batch::discover(&plan.cbp_search_paths);
        let report = batch::patch_all(&files, &settings, false);
        for line in report.lines(&settings) {
            println!("{}", line);
        }
    }

    Ok(0)
}
