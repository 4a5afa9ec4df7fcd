//! CLI argument parsing using clap derive

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// File stem under which the binary parses its own subcommands.
pub const SHIM_NAME: &str = "sdkshim";

/// sdkshim - Run build tools from an SDK and keep generated IDE projects
/// pointing into it
#[derive(Parser, Debug)]
#[command(name = "sdkshim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run a command through its configured SDK replacement
    ///
    /// Examples:
    ///   sdkshim exec -- cmake ../src -G "CodeBlocks - Unix Makefiles"
    ///   sdkshim exec -- bash
    Exec {
        /// The command line to wrap
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Show what a wrapped command would run, without running it
    Plan {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        /// The command line to plan
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Patch Code::Blocks project files to use the project's SDK
    ///
    /// Without file arguments, every *.cbp directly inside the build
    /// directory is patched.
    Patch {
        /// Preview changes as a diff without writing them
        #[arg(long)]
        dry_run: bool,

        /// Build directory the project files were generated into
        #[arg(long)]
        build: PathBuf,

        /// Source directory of the project (defaults to selection by build directory)
        #[arg(long)]
        project: Option<PathBuf>,

        /// Project files to patch
        files: Vec<PathBuf>,
    },

    /// Show located config files and the project selected for a directory
    Show {
        /// Directory to resolve (defaults to the current directory)
        dir: Option<PathBuf>,
    },

    /// Write a starter configuration to the home directory
    Init {
        /// SDK root for the wildcard project
        #[arg(long)]
        sdk: Option<String>,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

/// Whether `arg0` names this binary rather than a wrapped tool.
pub fn invoked_as_shim(arg0: &str) -> bool {
    Path::new(arg0)
        .file_stem()
        .is_some_and(|stem| stem == SHIM_NAME)
}
