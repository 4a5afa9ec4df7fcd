//! Running the planned command

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use crate::error::{CliError, Result};
use crate::invocation::env_pairs;
use crate::plan::ExecutionPlan;

/// Build the child process for `plan`.
///
/// The environment is replaced by the planned one; on Unix the child sees
/// the rewritten `args[0]` as its `argv[0]`.
pub fn command(plan: &ExecutionPlan) -> Command {
    let mut command = Command::new(&plan.exe_path);
    command
        .args(plan.args.iter().skip(1))
        .env_clear()
        .envs(env_pairs(&plan.env));

    if !plan.pwd.is_empty() {
        command.current_dir(&plan.pwd);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        if let Some(arg0) = plan.args.first() {
            command.arg0(arg0);
        }
    }

    command
}

/// Run the planned command with inherited stdio and wait for it.
///
/// Returns the child's exit code.
pub fn run(plan: &ExecutionPlan) -> Result<i32> {
    // Our own lines must not interleave with the child's output.
    std::io::stdout().flush()?;
    std::io::stderr().flush()?;

    tracing::debug!(exe = %plan.exe_path, args = ?plan.args, "executing");
    let status = command(plan).status().map_err(|source| CliError::Spawn {
        program: PathBuf::from(&plan.exe_path),
        source,
    })?;

    let code = exit_code(status);
    tracing::debug!(code, "child exited");
    Ok(code)
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
