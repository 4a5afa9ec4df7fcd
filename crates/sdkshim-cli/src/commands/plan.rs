//! Plan command implementation

use colored::Colorize;

use sdkshim_config::ConfigStore;

use crate::error::Result;
use crate::invocation::Invocation;
use crate::plan::{ExecutionPlan, Planner};

/// Print the execution plan for `command` without running it or touching
/// the configuration.
pub fn run_plan(command: Vec<String>, json: bool) -> Result<()> {
    let invocation = Invocation::capture(command);
    let store = ConfigStore::new();
    let plan = Planner::new(&store).read_only().plan(&invocation)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan, invocation.env.len());
    }
    Ok(())
}

/// `inherited_env` counts the leading environment entries taken from the
/// process; only the configured additions after them are listed.
fn print_plan(plan: &ExecutionPlan, inherited_env: usize) {
    println!("{} {}", "Run:".bold(), plan.exe_path.cyan());
    println!("{} {}", "Args:".bold(), plan.args.join(" "));
    println!("{} {}", "SDK:".bold(), plan.sdk_dir);
    println!("{} {}", "Config:".bold(), plan.config_path);

    let added = plan.env.get(inherited_env..).unwrap_or_default();
    if !added.is_empty() {
        println!("{}", "Environment:".bold());
        for entry in added {
            println!("   {} {}", "+".green(), entry);
        }
    }

    if plan.patches_project_files() {
        println!("{}", "Patches project files in:".bold());
        for dir in &plan.cbp_search_paths {
            println!("   {} {}", "-".yellow(), dir);
        }
    }
}
