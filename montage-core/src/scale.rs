//! Pixel-scale resolution from header keywords
//!
//! Each axis is resolved independently by trying an ordered list of
//! strategies. The first one that recognizes a keyword wins.

use crate::io::fits::FitsHeader;
use crate::types::ARCSEC_PER_DEGREE;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScaleError {
    #[error("No pixel-scale keyword for axis {axis} (tried {tried})")]
    MissingScale { axis: usize, tried: String },

    #[error("Pixel scale from {keyword} is not usable: {value}")]
    InvalidScale { keyword: String, value: f64 },
}

/// Arcseconds per pixel along each image axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale {
    pub x: f64,
    pub y: f64,
}

impl PixelScale {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn uniform(arcsec_per_pixel: f64) -> Self {
        Self::new(arcsec_per_pixel, arcsec_per_pixel)
    }
}

/// One way of reading a per-axis scale from a header. `axis` is 1 or 2.
pub trait ScaleStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Keyword and its arcsec-per-pixel value, or `None` if absent.
    fn resolve_axis(&self, header: &FitsHeader, axis: usize) -> Option<(String, f64)>;
}

/// `CDELTn` in degrees per pixel.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearDegreesPerPixel;

impl ScaleStrategy for LinearDegreesPerPixel {
    fn name(&self) -> &'static str {
        "CDELTn"
    }

    fn resolve_axis(&self, header: &FitsHeader, axis: usize) -> Option<(String, f64)> {
        let keyword = format!("CDELT{}", axis);
        let value = header.get_f64(&keyword)?;
        Some((keyword, ARCSEC_PER_DEGREE * value.abs()))
    }
}

/// `D001SCAL` in arcseconds per pixel, shared by both axes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArcsecPerPixel;

impl ScaleStrategy for ArcsecPerPixel {
    fn name(&self) -> &'static str {
        "D001SCAL"
    }

    fn resolve_axis(&self, header: &FitsHeader, _axis: usize) -> Option<(String, f64)> {
        let value = header.get_f64("D001SCAL")?;
        Some(("D001SCAL".to_string(), value.abs()))
    }
}

pub struct PixelScaleResolver {
    strategies: Vec<Box<dyn ScaleStrategy>>,
}

impl Default for PixelScaleResolver {
    fn default() -> Self {
        Self::new(vec![Box::new(LinearDegreesPerPixel), Box::new(ArcsecPerPixel)])
    }
}

impl PixelScaleResolver {
    pub fn new(strategies: Vec<Box<dyn ScaleStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn ScaleStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn resolve(&self, header: &FitsHeader) -> Result<PixelScale, ScaleError> {
        Ok(PixelScale::new(
            self.resolve_axis(header, 1)?,
            self.resolve_axis(header, 2)?,
        ))
    }

    fn resolve_axis(&self, header: &FitsHeader, axis: usize) -> Result<f64, ScaleError> {
        for strategy in &self.strategies {
            if let Some((keyword, value)) = strategy.resolve_axis(header, axis) {
                if !(value.is_finite() && value > 0.0) {
                    return Err(ScaleError::InvalidScale { keyword, value });
                }
                log::trace!("axis {} scale {:.6}\"/px from {}", axis, value, keyword);
                return Ok(value);
            }
        }
        let tried = self
            .strategies
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ScaleError::MissingScale { axis, tried })
    }
}
