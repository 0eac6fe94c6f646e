//! Raster page model and PDF export
//!
//! Every stage produces a [`Page`]: an RGB raster at a known resolution plus
//! text annotations kept as vector text. The page size in points is the
//! raster size scaled by `72 / dpi`.

use crate::error::{RenderError, Result};
use image::{DynamicImage, Rgb, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const MM_PER_PT: f32 = 25.4 / 72.0;
/// Baseline position below the top of a glyph box, as a fraction of font size.
const ASCENT: f32 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct TextAnnotation {
    /// Top-left corner of the text box in raster pixels, y down.
    pub x: f32,
    pub y: f32,
    /// Glyph height in raster pixels.
    pub size: f32,
    pub text: String,
    pub color: Rgb<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub raster: RgbImage,
    pub dpi: f32,
    pub annotations: Vec<TextAnnotation>,
}

impl Page {
    pub fn new(raster: RgbImage, dpi: f32) -> Self {
        Self { raster, dpi, annotations: Vec::new() }
    }

    pub fn blank(width: u32, height: u32, dpi: f32, background: Rgb<u8>) -> Self {
        Self::new(RgbImage::from_pixel(width, height, background), dpi)
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn px_to_pt(&self, px: f32) -> f32 {
        px * 72.0 / self.dpi
    }

    pub fn pt_to_px(&self, pt: f32) -> f32 {
        pt * self.dpi / 72.0
    }

    pub fn width_pt(&self) -> f32 {
        self.px_to_pt(self.width() as f32)
    }

    pub fn height_pt(&self) -> f32 {
        self.px_to_pt(self.height() as f32)
    }

    pub fn annotate(&mut self, annotation: TextAnnotation) {
        self.annotations.push(annotation);
    }

    pub fn write_pdf(&self, path: &Path, title: &str) -> Result<()> {
        let mut writer = PdfWriter::new(title)?;
        writer.add_page(self);
        writer.write_to_file(path)
    }
}

/// Multi-page PDF built from raster pages.
pub struct PdfWriter {
    doc: printpdf::PdfDocumentReference,
    font: printpdf::IndirectFontRef,
    pages: usize,
}

impl PdfWriter {
    pub fn new(title: &str) -> Result<Self> {
        use printpdf::BuiltinFont;
        let doc = printpdf::PdfDocument::empty(title);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(Self { doc, font, pages: 0 })
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn add_page(&mut self, page: &Page) {
        let width_mm = page.width_pt() * MM_PER_PT;
        let height_mm = page.height_pt() * MM_PER_PT;
        let (page_index, layer_index) = self.doc.add_page(
            printpdf::Mm(width_mm.into()),
            printpdf::Mm(height_mm.into()),
            "Layer 1",
        );
        let layer = self.doc.get_page(page_index).get_layer(layer_index);

        let image = printpdf::Image::from_dynamic_image(&DynamicImage::ImageRgb8(page.raster.clone()));
        image.add_to_layer(
            layer.clone(),
            printpdf::ImageTransform {
                dpi: Some(page.dpi.into()),
                ..Default::default()
            },
        );

        for note in &page.annotations {
            let [r, g, b] = note.color.0;
            let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
            layer.set_fill_color(printpdf::Color::Rgb(printpdf::Rgb::new(
                r.into(),
                g.into(),
                b.into(),
                None,
            )));
            let size_pt = page.px_to_pt(note.size);
            let x_mm = page.px_to_pt(note.x) * MM_PER_PT;
            let baseline_pt = page.height_pt() - page.px_to_pt(note.y + ASCENT * note.size);
            let y_mm = baseline_pt * MM_PER_PT;
            layer.use_text(
                note.text.as_str(),
                size_pt.into(),
                printpdf::Mm(x_mm.into()),
                printpdf::Mm(y_mm.into()),
                &self.font,
            );
        }

        self.pages += 1;
    }

    pub fn write<W: Write>(self, writer: W) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        self.doc
            .save(&mut writer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }

    /// Write through a temporary file in the destination directory, so a
    /// failed write never leaves a partial PDF under the final name.
    pub fn write_to_file(self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        let file: &File = tmp.as_file();
        self.write(file)?;
        tmp.persist(path).map_err(|e| RenderError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_in_points() {
        let page = Page::blank(500, 250, 100.0, Rgb([255, 255, 255]));
        assert!((page.width_pt() - 360.0).abs() < 1e-4);
        assert!((page.height_pt() - 180.0).abs() < 1e-4);
        assert!((page.pt_to_px(72.0) - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_pdf_bytes_have_header_and_trailer() {
        let mut page = Page::blank(40, 20, 72.0, Rgb([10, 20, 30]));
        page.annotate(TextAnnotation {
            x: 2.0,
            y: 2.0,
            size: 8.0,
            text: "SRC-1".into(),
            color: Rgb([255, 255, 255]),
        });
        let mut writer = PdfWriter::new("test").unwrap();
        writer.add_page(&page);
        writer.add_page(&page);
        assert_eq!(writer.page_count(), 2);

        let mut bytes = Vec::new();
        writer.write(&mut bytes).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let tail = String::from_utf8_lossy(&bytes[bytes.len().saturating_sub(32)..]).into_owned();
        assert!(tail.contains("%%EOF"));
    }
}
