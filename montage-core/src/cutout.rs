//! Coordinate-centred cutout extraction
//!
//! A cutout is the square window of `size` pixels centred on a sky position.
//! Windows that run off the image edge are trimmed to the overlap, and the
//! cutout records where that overlap sits inside the requested frame so the
//! renderer can keep the source centred.

use crate::bands::{BandSet, ImageBand};
use crate::io::fits::{FitsImage, HeaderValue};
use crate::types::{BandIndex, SkyCoord};
use crate::wcs::WcsError;
use ndarray::{s, Array2};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CutoutError {
    #[error("Cutout around {coord} does not overlap band {band}")]
    NoOverlap { band: BandIndex, coord: SkyCoord },

    #[error("Cannot place {coord} on band {band}: {source}")]
    Projection {
        band: BandIndex,
        coord: SkyCoord,
        source: WcsError,
    },
}

#[derive(Debug, Clone)]
pub struct Cutout {
    pub band: BandIndex,
    /// Requested side length in pixels.
    pub size: usize,
    /// Pixels of the overlap, `[row, column]` in FITS order.
    pub data: Array2<f64>,
    /// Position of `data[[0, 0]]` inside the requested `size x size` frame, as `(column, row)`.
    pub offset: (usize, usize),
    /// Position of the overlap's first pixel in the parent image, as `(column, row)`.
    pub origin: (usize, usize),
}

impl Cutout {
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_partial(&self) -> bool {
        self.width() != self.size || self.height() != self.size
    }

    /// Standalone FITS image of the overlap with a WCS shifted to match.
    pub fn to_fits(&self, band: &ImageBand) -> FitsImage {
        let mut header = band.header.clone();
        band.wcs
            .offset(self.origin.0 as f64, self.origin.1 as f64)
            .write_header(&mut header);
        header.set("BAND", HeaderValue::String(band.id.name.clone()));
        FitsImage::new(header, self.data.clone())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CoordinateCutoutExtractor {
    size: usize,
}

impl CoordinateCutoutExtractor {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    /// Extractor sized from the reference band's pixel scale.
    pub fn for_bands(bands: &BandSet, size_arcsec: f64) -> Self {
        Self::new(bands.cutout_pixels(size_arcsec))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn extract(&self, band: &ImageBand, coord: SkyCoord) -> Result<Cutout, CutoutError> {
        let (px, py) = band
            .wcs
            .world_to_pixel(coord)
            .map_err(|source| CutoutError::Projection { band: band.index(), coord, source })?;
        let no_overlap = || CutoutError::NoOverlap { band: band.index(), coord };
        if !(px.is_finite() && py.is_finite()) {
            return Err(no_overlap());
        }

        let half = self.size as f64 / 2.0;
        let start_x = (px - half).ceil() as i64;
        let start_y = (py - half).ceil() as i64;
        let n = self.size as i64;

        let x0 = start_x.max(0);
        let y0 = start_y.max(0);
        let x1 = (start_x + n).min(band.width() as i64);
        let y1 = (start_y + n).min(band.height() as i64);
        if x0 >= x1 || y0 >= y1 {
            return Err(no_overlap());
        }

        let data = band
            .data
            .slice(s![y0 as usize..y1 as usize, x0 as usize..x1 as usize])
            .to_owned();

        let cutout = Cutout {
            band: band.index(),
            size: self.size,
            data,
            offset: ((x0 - start_x) as usize, (y0 - start_y) as usize),
            origin: (x0 as usize, y0 as usize),
        };

        if cutout.is_partial() {
            log::info!(
                "Cutout at {} on band {} trimmed to {}x{} of {}x{}",
                coord,
                band.id,
                cutout.width(),
                cutout.height(),
                self.size,
                self.size
            );
        }
        Ok(cutout)
    }

    /// One result per band, in band order.
    pub fn extract_all(
        &self,
        bands: &BandSet,
        coord: SkyCoord,
    ) -> Vec<Result<Cutout, CutoutError>> {
        bands.iter().map(|band| self.extract(band, coord)).collect()
    }
}
