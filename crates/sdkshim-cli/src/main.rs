//! sdkshim CLI
//!
//! Invoked as `sdkshim`, the binary parses its own subcommands. Invoked
//! under any other name (typically a symlink such as `xcmake`), the whole
//! command line is wrapped: it is replaced by the configured SDK command,
//! run, and the project files it generated are patched afterwards.

mod batch;
mod cli;
mod commands;
mod error;
mod exec;
mod invocation;
mod logging;
mod plan;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, invoked_as_shim};
use error::Result;
use sdkshim_fs::NormalizedPath;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let args: Vec<String> = std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    if !args.first().is_some_and(|arg0| invoked_as_shim(arg0)) {
        init_logging(false);
        return commands::run_wrapped(args);
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);
    tracing::debug!("Verbose mode enabled");
    execute_command(cli.command)
}

fn init_logging(verbose: bool) {
    if let Err(e) = logging::init(verbose) {
        eprintln!("{}: failed to initialize logging: {}", "warning".yellow().bold(), e);
    }
}

fn execute_command(cmd: Commands) -> Result<i32> {
    match cmd {
        Commands::Exec { command } => commands::run_wrapped(command),
        Commands::Plan { json, command } => commands::run_plan(command, json).map(|_| 0),
        Commands::Patch {
            dry_run,
            build,
            project,
            files,
        } => commands::run_patch(&build, project.as_deref(), &files, dry_run).map(|_| 0),
        Commands::Show { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            commands::run_show(&dir).map(|_| 0)
        }
        Commands::Init { sdk, force } => {
            let home = dirs::home_dir()
                .map(NormalizedPath::new)
                .ok_or_else(|| error::CliError::user("Cannot determine the home directory"))?;
            commands::run_init(&home, sdk.as_deref(), force).map(|_| 0)
        }
    }
}
