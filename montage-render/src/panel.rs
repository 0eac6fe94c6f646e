//! Per-(source, band) panel rendering
//!
//! A panel is a square page with the normalized cutout drawn in grayscale
//! inside a fixed axes box, the source ellipse outlined on top, and no axes,
//! ticks or labels. Row 0 of the cutout is drawn at the bottom.

use crate::error::Result;
use crate::page::Page;
use crate::raster::draw_closed_path;
use crate::style::RenderStyle;
use image::Rgb;
use montage_core::{Cutout, EllipseOverlay};
use ndarray::Array2;

/// Axes box as fractions of the page, measured from the bottom-left corner.
pub const AXES_LEFT: f64 = 0.125;
pub const AXES_RIGHT: f64 = 0.9;
pub const AXES_BOTTOM: f64 = 0.11;
pub const AXES_TOP: f64 = 0.88;

const ELLIPSE_SEGMENTS: usize = 180;

/// Where the square image frame lands on the page, in page pixels (y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRect {
    pub left: f64,
    pub top: f64,
    pub side: f64,
}

pub struct PanelRenderer {
    style: RenderStyle,
    page_px: u32,
    background: Rgb<u8>,
    ellipse_color: Rgb<u8>,
}

impl PanelRenderer {
    pub fn new(style: &RenderStyle) -> Result<Self> {
        style.validate()?;
        let page_px = (style.panel_size_in * style.panel_dpi).round().max(1.0) as u32;
        Ok(Self {
            style: style.clone(),
            page_px,
            background: style.background()?,
            ellipse_color: style.ellipse()?,
        })
    }

    pub fn page_px(&self) -> u32 {
        self.page_px
    }

    /// Square frame with equal aspect, centred in the axes box.
    pub fn frame_rect(&self) -> FrameRect {
        let page = self.page_px as f64;
        let axes_left = AXES_LEFT * page;
        let axes_w = (AXES_RIGHT - AXES_LEFT) * page;
        let axes_top = (1.0 - AXES_TOP) * page;
        let axes_h = (AXES_TOP - AXES_BOTTOM) * page;
        let side = axes_w.min(axes_h);
        FrameRect {
            left: axes_left + (axes_w - side) / 2.0,
            top: axes_top + (axes_h - side) / 2.0,
            side,
        }
    }

    /// `normalized` must have the shape of `cutout.data`, values in `[0, 1]`
    /// or NaN for blank pixels.
    pub fn render(
        &self,
        cutout: &Cutout,
        normalized: &Array2<f64>,
        overlay: &EllipseOverlay,
    ) -> Page {
        let mut page = Page::blank(self.page_px, self.page_px, self.style.panel_dpi, self.background);
        let frame = self.frame_rect();
        let n = cutout.size as f64;
        let (off_x, off_y) = cutout.offset;
        let (rows, cols) = normalized.dim();

        let x_start = frame.left.floor().max(0.0) as u32;
        let x_end = ((frame.left + frame.side).ceil() as u32).min(self.page_px);
        let y_start = frame.top.floor().max(0.0) as u32;
        let y_end = ((frame.top + frame.side).ceil() as u32).min(self.page_px);

        for py in y_start..y_end {
            let v = (py as f64 + 0.5 - frame.top) / frame.side;
            if !(0.0..1.0).contains(&v) {
                continue;
            }
            // Display y grows downward; frame rows grow upward
            let frame_row = ((1.0 - v) * n).floor() as usize;
            for px in x_start..x_end {
                let u = (px as f64 + 0.5 - frame.left) / frame.side;
                if !(0.0..1.0).contains(&u) {
                    continue;
                }
                let frame_col = (u * n).floor() as usize;
                if frame_col < off_x || frame_row < off_y {
                    continue;
                }
                let (r, c) = (frame_row - off_y, frame_col - off_x);
                if r >= rows || c >= cols {
                    continue;
                }
                let value = normalized[[r, c]];
                if value.is_finite() {
                    let g = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
                    page.raster.put_pixel(px, py, Rgb([g, g, g]));
                }
            }
        }

        let to_page = |(x, y): (f64, f64)| {
            (
                frame.left + (x + 0.5) / n * frame.side,
                frame.top + frame.side - (y + 0.5) / n * frame.side,
            )
        };
        let outline: Vec<(f64, f64)> = overlay
            .boundary(ELLIPSE_SEGMENTS)
            .into_iter()
            .map(to_page)
            .collect();
        let line_px = page.pt_to_px(self.style.ellipse_line_width_pt) as f64;
        draw_closed_path(&mut page.raster, &outline, line_px, self.ellipse_color);

        page
    }
}
