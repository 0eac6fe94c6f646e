//! Configuration handling for the montage CLI
//!
//! Run parameters, input files and render settings come from a `montage.toml`
//! file. The parsed [`Config`] is validated once and then passed by reference
//! to every stage.

use anyhow::{Context, Result};
use montage_render::{CropBox, RenderStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CliError;

pub const DEFAULT_CONFIG_FILE: &str = "montage.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub render: RenderStyle,
    #[serde(default)]
    pub general: GeneralConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParametersConfig {
    /// Angular side of each cutout, arcseconds
    #[serde(default = "default_size_arcsec")]
    pub size_arcsec: f64,

    /// Thumbnail crop box on the panel page, points: [left, bottom, right, top]
    #[serde(default = "default_crop_box")]
    pub crop_box: [f32; 4],

    /// Thumbnail size in pixels: [width, height]
    #[serde(default = "default_target_size")]
    pub target_size: [u32; 2],

    /// Strips per report page
    #[serde(default = "default_figures_per_page")]
    pub number_figures_per_page: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Source catalog (CSV with ID, RA, DEC, Major, Minor, PA)
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,

    /// Radio image; always band 0
    #[serde(default = "default_radio")]
    pub radio: PathBuf,

    #[serde(default)]
    pub optical: Vec<PathBuf>,

    #[serde(default)]
    pub infrared: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving every artifact
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Write panel and thumbnail PDFs next to the strips
    #[serde(default = "default_true")]
    pub keep_intermediates: bool,

    /// Also export each cutout as a FITS image
    #[serde(default)]
    pub write_cutouts: bool,

    /// Optional multi-page PDF holding every report page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_report: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Worker threads; 0 leaves the choice to rayon
    #[serde(default)]
    pub threads: usize,

    /// Show a progress bar on interactive terminals
    #[serde(default = "default_true")]
    pub progress: bool,
}

// Default value functions
fn default_size_arcsec() -> f64 { 10.0 }
fn default_crop_box() -> [f32; 4] { [46.0, 40.0, 323.0, 317.0] }
fn default_target_size() -> [u32; 2] { [300, 300] }
fn default_figures_per_page() -> usize { 5 }
fn default_catalog() -> PathBuf { PathBuf::from("catalog.csv") }
fn default_radio() -> PathBuf { PathBuf::from("radio.fits") }
fn default_directory() -> PathBuf { PathBuf::from(".") }
fn default_true() -> bool { true }

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            size_arcsec: default_size_arcsec(),
            crop_box: default_crop_box(),
            target_size: default_target_size(),
            number_figures_per_page: default_figures_per_page(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            radio: default_radio(),
            optical: Vec::new(),
            infrared: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            keep_intermediates: true,
            write_cutouts: false,
            combined_report: None,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { threads: 0, progress: true }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::file_not_found(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).map_err(CliError::from)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(CliError::from)?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Example configuration file content
    pub fn example_toml() -> Result<String> {
        let mut config = Self::default();
        config.files.optical = vec!["hst_f606w.fits".into(), "hst_f814w.fits".into()];
        config.files.infrared = vec!["jwst_f150w.fits".into(), "jwst_f444w.fits".into()];
        let content = toml::to_string_pretty(&config).map_err(CliError::from)?;
        Ok(content)
    }

    pub fn crop_box(&self) -> CropBox {
        CropBox::from_array(self.parameters.crop_box)
    }

    pub fn target_size(&self) -> (u32, u32) {
        let [w, h] = self.parameters.target_size;
        (w, h)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> std::result::Result<(), CliError> {
        let p = &self.parameters;
        if !(p.size_arcsec.is_finite() && p.size_arcsec > 0.0) {
            return Err(CliError::validation(format!(
                "size_arcsec must be positive, got {}",
                p.size_arcsec
            )));
        }

        let [left, bottom, right, top] = p.crop_box;
        if !(left < right && bottom < top) || left < 0.0 || bottom < 0.0 {
            return Err(CliError::validation(format!(
                "crop_box must be [left, bottom, right, top] with left < right and bottom < top, got {:?}",
                p.crop_box
            )));
        }

        if p.target_size.contains(&0) {
            return Err(CliError::validation(format!(
                "target_size must be non-zero, got {:?}",
                p.target_size
            )));
        }

        if p.number_figures_per_page == 0 {
            return Err(CliError::validation("number_figures_per_page must be at least 1"));
        }

        if self.files.radio.as_os_str().is_empty() {
            return Err(CliError::validation("files.radio is required"));
        }

        self.render
            .validate()
            .map_err(|e| CliError::config(e.to_string()))?;

        Ok(())
    }
}
