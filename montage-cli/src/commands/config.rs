//! Config command implementation - print or save configuration

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::CliError;

/// Print the effective configuration, or the example file with `example`.
/// With `output` the content goes to that file instead of stdout.
pub fn execute(config: &Config, example: bool, output: Option<PathBuf>) -> Result<()> {
    match (example, output) {
        (false, Some(path)) => {
            config.save_to_file(&path)?;
            log::info!("Wrote configuration to {}", path.display());
        }
        (true, Some(path)) => {
            std::fs::write(&path, Config::example_toml()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote example configuration to {}", path.display());
        }
        (true, None) => print!("{}", Config::example_toml()?),
        (false, None) => print!("{}", toml::to_string_pretty(config).map_err(CliError::from)?),
    }
    Ok(())
}
