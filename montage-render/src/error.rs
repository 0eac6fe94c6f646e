use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Crop box [{left}, {bottom}, {right}, {top}] lies outside the {width}x{height} pt page")]
    CropOutOfRange {
        left: f32,
        bottom: f32,
        right: f32,
        top: f32,
        width: f32,
        height: f32,
    },

    #[error("Missing artifact {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("No thumbnails available for source {0}")]
    EmptyStrip(String),

    #[error("Invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    #[error("Invalid render style: {0}")]
    InvalidStyle(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
