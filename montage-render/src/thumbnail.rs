//! Crop, resize and label panels into uniform thumbnails

use crate::error::{RenderError, Result};
use crate::page::{Page, TextAnnotation};
use crate::style::RenderStyle;
use image::imageops::{self, FilterType};
use image::Rgb;
use serde::{Deserialize, Serialize};

/// Thumbnails are 1 pixel per point.
pub const THUMBNAIL_DPI: f32 = 72.0;

/// Crop rectangle in page points, origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl CropBox {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self { left, bottom, right, top }
    }

    pub fn from_array([left, bottom, right, top]: [f32; 4]) -> Self {
        Self::new(left, bottom, right, top)
    }

    pub fn fits_within(&self, width_pt: f32, height_pt: f32) -> bool {
        let finite = [self.left, self.bottom, self.right, self.top]
            .iter()
            .all(|v| v.is_finite());
        finite
            && 0.0 <= self.left
            && self.left < self.right
            && self.right <= width_pt
            && 0.0 <= self.bottom
            && self.bottom < self.top
            && self.top <= height_pt
    }
}

pub struct PageCropResizeLabeler {
    crop: CropBox,
    target: (u32, u32),
    label_size: f32,
    label_offset: [u32; 2],
    label_color: Rgb<u8>,
}

impl PageCropResizeLabeler {
    pub fn new(crop: CropBox, target: (u32, u32), style: &RenderStyle) -> Result<Self> {
        Ok(Self {
            crop,
            target: (target.0.max(1), target.1.max(1)),
            label_size: style.label_font_size,
            label_offset: style.label_offset,
            label_color: style.label()?,
        })
    }

    pub fn target(&self) -> (u32, u32) {
        self.target
    }

    pub fn apply(&self, panel: &Page, label: Option<&str>) -> Result<Page> {
        let (width_pt, height_pt) = (panel.width_pt(), panel.height_pt());
        let c = self.crop;
        if !c.fits_within(width_pt, height_pt) {
            return Err(RenderError::CropOutOfRange {
                left: c.left,
                bottom: c.bottom,
                right: c.right,
                top: c.top,
                width: width_pt,
                height: height_pt,
            });
        }

        // Page points are y-up, raster rows are y-down
        let x0 = panel.pt_to_px(c.left).round() as u32;
        let x1 = (panel.pt_to_px(c.right).round() as u32).min(panel.width());
        let y0 = panel.pt_to_px(height_pt - c.top).round() as u32;
        let y1 = (panel.pt_to_px(height_pt - c.bottom).round() as u32).min(panel.height());
        let (w, h) = (x1.saturating_sub(x0).max(1), y1.saturating_sub(y0).max(1));

        let cropped = imageops::crop_imm(&panel.raster, x0.min(panel.width() - 1), y0.min(panel.height() - 1), w, h)
            .to_image();
        let resized = imageops::resize(&cropped, self.target.0, self.target.1, FilterType::Lanczos3);
        log::trace!("crop {}x{}+{}+{} -> {}x{}", w, h, x0, y0, self.target.0, self.target.1);

        let mut thumb = Page::new(resized, THUMBNAIL_DPI);
        if let Some(text) = label {
            thumb.annotate(TextAnnotation {
                x: self.label_offset[0] as f32,
                y: self.label_offset[1] as f32,
                size: self.label_size,
                text: text.to_string(),
                color: self.label_color,
            });
        }
        Ok(thumb)
    }
}
