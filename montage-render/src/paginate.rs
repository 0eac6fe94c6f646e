//! Report pagination
//!
//! Strips are grouped in catalog order into chunks of `per_page`. Each chunk
//! becomes one page laid out as a single column with one equal-height row
//! per strip. Each strip is scaled to fit its row with its aspect kept.

use crate::error::Result;
use crate::page::{Page, TextAnnotation};
use crate::style::RenderStyle;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

#[derive(Debug, Clone, PartialEq)]
pub struct ReportPage {
    /// 1-based page number.
    pub number: usize,
    /// Number of strips on the page.
    pub rows: usize,
    pub page: Page,
}

pub struct PageGridPaginator {
    per_page: usize,
    width: u32,
    height: u32,
    dpi: f32,
    margin: u32,
    background: Rgb<u8>,
}

impl PageGridPaginator {
    pub fn new(per_page: usize, style: &RenderStyle) -> Result<Self> {
        style.validate()?;
        Ok(Self {
            per_page: per_page.max(1),
            width: (style.report_width_in * style.report_dpi).round() as u32,
            height: (style.report_height_in * style.report_dpi).round() as u32,
            dpi: style.report_dpi,
            margin: style.report_margin_px,
            background: style.background()?,
        })
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of pages for `strips` strips.
    pub fn page_count(&self, strips: usize) -> usize {
        strips.div_ceil(self.per_page)
    }

    pub fn paginate(&self, strips: &[&Page]) -> Vec<ReportPage> {
        strips
            .chunks(self.per_page)
            .enumerate()
            .map(|(i, chunk)| ReportPage {
                number: i + 1,
                rows: chunk.len(),
                page: self.layout(chunk),
            })
            .collect()
    }

    fn layout(&self, chunk: &[&Page]) -> Page {
        let mut canvas = RgbImage::from_pixel(self.width, self.height, self.background);
        let mut annotations = Vec::new();
        let rows = chunk.len().max(1) as u32;
        let row_h = self.height / rows;
        let cell_w = self.width.saturating_sub(2 * self.margin).max(1);
        let cell_h = row_h.saturating_sub(2 * self.margin).max(1);

        for (i, strip) in chunk.iter().enumerate() {
            if strip.width() == 0 || strip.height() == 0 {
                continue;
            }
            let scale = (cell_w as f32 / strip.width() as f32)
                .min(cell_h as f32 / strip.height() as f32);
            let w = ((strip.width() as f32 * scale).round() as u32).clamp(1, cell_w);
            let h = ((strip.height() as f32 * scale).round() as u32).clamp(1, cell_h);
            let resized = imageops::resize(&strip.raster, w, h, FilterType::Lanczos3);

            let x = self.width.saturating_sub(w) / 2;
            let y = i as u32 * row_h + row_h.saturating_sub(h) / 2;
            imageops::replace(&mut canvas, &resized, x as i64, y as i64);

            annotations.extend(strip.annotations.iter().map(|a| TextAnnotation {
                x: x as f32 + a.x * scale,
                y: y as f32 + a.y * scale,
                size: a.size * scale,
                ..a.clone()
            }));
        }

        Page { raster: canvas, dpi: self.dpi, annotations }
    }
}
