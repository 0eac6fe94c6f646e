//! Inspect command implementation - summarize the configured images

use anyhow::Result;
use montage_core::{BandSet, PixelScaleResolver};

use crate::config::Config;
use crate::error::CliError;

/// One line per band: shape, resolved pixel scale and projection.
pub fn describe(bands: &BandSet, size_arcsec: f64) -> Vec<String> {
    let mut lines: Vec<String> = bands
        .iter()
        .map(|band| {
            let ctype = band.header.get_str("CTYPE1").unwrap_or("?");
            format!(
                "band {} {:<8} {:<24} {:>6}x{:<6} axes={:?} scale={:.4}\"x{:.4}\" ctype={}",
                band.index(),
                band.kind(),
                band.id.name,
                band.width(),
                band.height(),
                band.axes,
                band.scale.x,
                band.scale.y,
                ctype.trim()
            )
        })
        .collect();

    if let Some(reference) = bands.reference() {
        lines.push(format!(
            "cutout: {}\" = {} px (reference band {})",
            size_arcsec,
            bands.cutout_pixels(size_arcsec),
            reference.id.name
        ));
    }
    lines
}

pub fn execute(config: &Config) -> Result<()> {
    let files = &config.files;
    for path in std::iter::once(&files.radio)
        .chain(files.optical.iter())
        .chain(files.infrared.iter())
    {
        if !path.exists() {
            return Err(CliError::file_not_found(path.clone()).into());
        }
    }

    let resolver = PixelScaleResolver::default();
    let bands = BandSet::load(&files.radio, &files.optical, &files.infrared, &resolver)
        .map_err(|e| CliError::band(e.to_string()))?;

    for line in describe(&bands, config.parameters.size_arcsec) {
        println!("{}", line);
    }
    Ok(())
}
