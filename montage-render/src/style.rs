//! Render style shared by every stage

use crate::error::{RenderError, Result};
use image::Rgb;
use serde::{Deserialize, Serialize};

/// Page geometry, colors and text settings. Deserialized from the `[render]`
/// table of the run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Side of the square panel page, inches.
    pub panel_size_in: f32,
    pub panel_dpi: f32,
    pub background_color: String,
    pub ellipse_color: String,
    pub ellipse_line_width_pt: f32,
    /// Label glyph height in thumbnail pixels.
    pub label_font_size: f32,
    pub label_color: String,
    /// Label top-left corner in thumbnail pixels.
    pub label_offset: [u32; 2],
    pub strip_gap_px: u32,
    pub strip_dpi: f32,
    pub report_width_in: f32,
    pub report_height_in: f32,
    pub report_dpi: f32,
    pub report_margin_px: u32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            panel_size_in: 5.0,
            panel_dpi: 100.0,
            background_color: "#ffffff".to_string(),
            ellipse_color: "#ff0000".to_string(),
            ellipse_line_width_pt: 2.0,
            label_font_size: 20.0,
            label_color: "#ffffff".to_string(),
            label_offset: [10, 10],
            strip_gap_px: 5,
            strip_dpi: 100.0,
            report_width_in: 8.0,
            report_height_in: 10.0,
            report_dpi: 100.0,
            report_margin_px: 10,
        }
    }
}

impl RenderStyle {
    pub fn background(&self) -> Result<Rgb<u8>> {
        parse_hex_rgb(&self.background_color)
    }

    pub fn ellipse(&self) -> Result<Rgb<u8>> {
        parse_hex_rgb(&self.ellipse_color)
    }

    pub fn label(&self) -> Result<Rgb<u8>> {
        parse_hex_rgb(&self.label_color)
    }

    /// Check every color parses and every size is positive.
    pub fn validate(&self) -> Result<()> {
        self.background()?;
        self.ellipse()?;
        self.label()?;
        let sizes = [
            ("panel_size_in", self.panel_size_in),
            ("panel_dpi", self.panel_dpi),
            ("strip_dpi", self.strip_dpi),
            ("report_width_in", self.report_width_in),
            ("report_height_in", self.report_height_in),
            ("report_dpi", self.report_dpi),
        ];
        for (name, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(RenderError::InvalidStyle(format!("{} must be positive, got {}", name, value)));
            }
        }
        Ok(())
    }
}

/// Parse a hex color like "#RRGGBB".
pub fn parse_hex_rgb(s: &str) -> Result<Rgb<u8>> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    let invalid = || RenderError::InvalidColor(s.to_string());
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}
