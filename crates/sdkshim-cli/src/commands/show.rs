//! Show command implementation

use std::path::Path;

use colored::Colorize;

use sdkshim_config::ConfigStore;
use sdkshim_fs::simplify;

use crate::error::Result;
use crate::invocation::Invocation;
use crate::plan::Planner;

/// Print the config files found for `dir` and the merged project it
/// resolves to.
pub fn run_show(dir: &Path) -> Result<()> {
    let dir = simplify(&dir.to_string_lossy());
    let invocation = Invocation::capture(Vec::new());
    let store = ConfigStore::new();
    let planner = Planner::new(&store).read_only();

    let candidates = planner.config_candidates(&invocation, "", &dir);
    println!("{}", "Config files:".bold());
    if candidates.is_empty() {
        println!("   {}", "(none)".dimmed());
    }
    for path in &candidates {
        println!("   {} {}", "-".yellow(), path);
    }
    println!();

    let (loaded, project) = planner.resolve(&invocation, "", &dir)?;
    println!(
        "{} {} {} {}",
        "Project:".bold(),
        project.path.cyan(),
        "from".dimmed(),
        loaded.path
    );
    println!("{}", serde_json::to_string_pretty(&project)?);
    Ok(())
}
