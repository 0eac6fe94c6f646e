//! Run command implementation - the full montage pipeline

use anyhow::Result;
use std::io::IsTerminal;

use crate::config::Config;
use crate::pipeline::{load_inputs, Pipeline, RunSummary};

pub fn execute(config: &Config, quiet: bool) -> Result<RunSummary> {
    log::info!("Starting montage run");
    log::info!("Output directory: {}", config.output.directory.display());

    let (catalog, bands) = load_inputs(config)?;
    let mut pipeline = Pipeline::new(config, &catalog, &bands)?;
    if config.general.progress && !quiet && std::io::stderr().is_terminal() {
        pipeline = pipeline.with_progress()?;
    }

    let summary = pipeline.run()?;
    summary.log();
    Ok(summary)
}
