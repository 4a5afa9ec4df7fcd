//! Init command implementation

use colored::Colorize;

use sdkshim_config::{CONFIG_FILENAME, Config, ConfigStore, Project, SDK_PATH_PLACEHOLDER, WILDCARD};
use sdkshim_fs::NormalizedPath;

use crate::error::{CliError, Result};

/// Tools redirected into the SDK by the starter configuration.
const STARTER_TOOLS: [&str; 2] = ["cmake", "ctest"];

/// Starter configuration: a wildcard project bound to `sdk` that runs the
/// SDK's cmake and ctest.
pub fn starter_config(sdk: &str) -> Config {
    let mut config = Config::default();
    for tool in STARTER_TOOLS {
        let exe = format!("{}usr/bin/{}", SDK_PATH_PLACEHOLDER, tool);
        config
            .shared
            .cmd_replacement
            .insert(tool.to_string(), vec![exe.clone(), exe]);
    }
    config.projects.push(Project::new(WILDCARD, sdk));
    config
}

/// Write the starter configuration into `home`.
pub fn run_init(home: &NormalizedPath, sdk: Option<&str>, force: bool) -> Result<NormalizedPath> {
    let path = home.join(CONFIG_FILENAME);
    if path.exists() && !force {
        return Err(CliError::user(format!(
            "{} already exists (use --force to overwrite)",
            path
        )));
    }

    let sdk = sdk.unwrap_or_default();
    ConfigStore::new().save(&path, &starter_config(sdk))?;

    println!("{} Wrote {}", "OK".green().bold(), path.to_string().cyan());
    if sdk.is_empty() {
        println!("Set {} of the {} project before wrapping commands.", "sdkPath".cyan(), WILDCARD);
    }
    Ok(path)
}
