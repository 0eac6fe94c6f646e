//! Clean command implementation - remove per-band intermediate PDFs

use anyhow::{Context, Result};
use montage_core::Catalog;
use montage_render::ArtifactKey;
use std::io::ErrorKind;

use crate::config::Config;
use crate::error::CliError;

/// Delete every panel and thumbnail PDF the catalog and band list can name.
/// Files that are already gone are not an error. Returns how many were removed.
pub fn execute(config: &Config) -> Result<usize> {
    let catalog_path = &config.files.catalog;
    if !catalog_path.exists() {
        return Err(CliError::file_not_found(catalog_path.clone()).into());
    }
    let catalog = Catalog::from_path(catalog_path)
        .map_err(|e| CliError::catalog(catalog_path.clone(), e.to_string()))?;

    let band_count = 1 + config.files.optical.len() + config.files.infrared.len();
    let dir = &config.output.directory;
    let mut removed = 0;

    for record in catalog.iter() {
        let stem = record.file_stem();
        for band in 0..band_count {
            for key in [ArtifactKey::panel(&stem, band), ArtifactKey::thumbnail(&stem, band)] {
                let path = dir.join(key.file_name());
                match std::fs::remove_file(&path) {
                    Ok(()) => {
                        log::debug!("Removed {}", path.display());
                        removed += 1;
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(e).with_context(|| format!("Failed to remove {}", path.display()))
                    }
                }
            }
        }
    }

    log::info!("Removed {} intermediate files from {}", removed, dir.display());
    Ok(removed)
}
