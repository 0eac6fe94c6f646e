//! Horizontal strips of one source's thumbnails

use crate::error::{RenderError, Result};
use crate::page::{Page, TextAnnotation};
use crate::style::RenderStyle;
use image::{imageops, Rgb, RgbImage};

pub struct RowCompositor {
    gap: u32,
    dpi: f32,
    background: Rgb<u8>,
}

impl RowCompositor {
    pub fn new(style: &RenderStyle) -> Result<Self> {
        Ok(Self {
            gap: style.strip_gap_px,
            dpi: style.strip_dpi,
            background: style.background()?,
        })
    }

    /// Canvas size for thumbnails of the given sizes.
    pub fn strip_size(&self, sizes: &[(u32, u32)]) -> (u32, u32) {
        let width: u32 = sizes.iter().map(|s| s.0).sum::<u32>()
            + self.gap * (sizes.len().saturating_sub(1) as u32);
        let height = sizes.iter().map(|s| s.1).max().unwrap_or(0);
        (width, height)
    }

    /// Paste thumbnails left to right, top-aligned, in the order given.
    pub fn compose(&self, source_id: &str, thumbnails: &[&Page]) -> Result<Page> {
        if thumbnails.is_empty() {
            return Err(RenderError::EmptyStrip(source_id.to_string()));
        }
        let sizes: Vec<(u32, u32)> = thumbnails.iter().map(|t| (t.width(), t.height())).collect();
        let (width, height) = self.strip_size(&sizes);

        let mut canvas = RgbImage::from_pixel(width, height, self.background);
        let mut annotations = Vec::new();
        let mut x = 0u32;
        for thumb in thumbnails {
            imageops::replace(&mut canvas, &thumb.raster, x as i64, 0);
            annotations.extend(thumb.annotations.iter().map(|a| TextAnnotation {
                x: a.x + x as f32,
                ..a.clone()
            }));
            x += thumb.width() + self.gap;
        }

        log::debug!("strip {}: {} thumbnails, {}x{}", source_id, thumbnails.len(), width, height);
        Ok(Page { raster: canvas, dpi: self.dpi, annotations })
    }
}
