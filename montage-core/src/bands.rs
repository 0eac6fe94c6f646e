//! Image band registry
//!
//! Every input image is opened once, its pixel scale and WCS resolved up
//! front, and then shared read-only by all per-source work.

use crate::io::fits::{FitsError, FitsHeader, FitsImage};
use crate::scale::{PixelScale, PixelScaleResolver, ScaleError};
use crate::types::{BandId, BandIndex, BandKind, RADIO_BAND_INDEX};
use crate::wcs::{Wcs, WcsError};
use ndarray::Array2;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BandError {
    #[error("{}: {source}", path.display())]
    Fits { path: PathBuf, source: FitsError },

    #[error("band {band}: {source}")]
    Scale { band: String, source: ScaleError },

    #[error("band {band}: {source}")]
    Wcs { band: String, source: WcsError },
}

#[derive(Debug, Clone)]
pub struct ImageBand {
    pub id: BandId,
    pub header: FitsHeader,
    /// Original NAXISn values.
    pub axes: Vec<usize>,
    pub data: Array2<f64>,
    pub scale: PixelScale,
    pub wcs: Wcs,
}

impl ImageBand {
    pub fn open(
        index: BandIndex,
        kind: BandKind,
        path: &Path,
        resolver: &PixelScaleResolver,
    ) -> Result<Self, BandError> {
        let image = FitsImage::open(path).map_err(|source| BandError::Fits {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("band{}", index));
        Self::from_image(BandId::new(index, kind, name), image, resolver)
    }

    pub fn from_image(
        id: BandId,
        image: FitsImage,
        resolver: &PixelScaleResolver,
    ) -> Result<Self, BandError> {
        let scale = resolver.resolve(&image.header).map_err(|source| BandError::Scale {
            band: id.name.clone(),
            source,
        })?;
        let wcs = Wcs::from_header(&image.header).map_err(|source| BandError::Wcs {
            band: id.name.clone(),
            source,
        })?;

        if image.axes.len() > 2 {
            // Radio maps routinely carry degenerate frequency/Stokes axes
            log::warn!(
                "{} image {} has {} axes {:?}; using the first plane",
                id.kind,
                id.name,
                image.axes.len(),
                image.axes
            );
        }

        log::info!(
            "Registered band {}: {}x{} px, {:.4}\"/px",
            id,
            image.width(),
            image.height(),
            scale.x
        );

        Ok(Self {
            id,
            header: image.header,
            axes: image.axes,
            data: image.data,
            scale,
            wcs,
        })
    }

    pub fn index(&self) -> BandIndex {
        self.id.index
    }

    pub fn kind(&self) -> BandKind {
        self.id.kind
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

/// Bands in montage column order: radio first, then optical, then infrared.
#[derive(Debug, Clone)]
pub struct BandSet {
    bands: Vec<ImageBand>,
}

impl BandSet {
    pub fn load(
        radio: &Path,
        optical: &[PathBuf],
        infrared: &[PathBuf],
        resolver: &PixelScaleResolver,
    ) -> Result<Self, BandError> {
        let mut bands = Vec::with_capacity(1 + optical.len() + infrared.len());
        bands.push(ImageBand::open(RADIO_BAND_INDEX, BandKind::Radio, radio, resolver)?);

        let rest = optical
            .iter()
            .map(|p| (BandKind::Optical, p))
            .chain(infrared.iter().map(|p| (BandKind::Infrared, p)));
        for (kind, path) in rest {
            bands.push(ImageBand::open(bands.len(), kind, path, resolver)?);
        }

        Ok(Self { bands })
    }

    /// Build from already-opened bands, renumbering them by position.
    pub fn from_bands(mut bands: Vec<ImageBand>) -> Self {
        for (i, band) in bands.iter_mut().enumerate() {
            band.id.index = i;
        }
        Self { bands }
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn get(&self, index: BandIndex) -> Option<&ImageBand> {
        self.bands.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageBand> {
        self.bands.iter()
    }

    pub fn as_slice(&self) -> &[ImageBand] {
        &self.bands
    }

    /// Band whose x scale fixes the cutout size: the first optical or
    /// infrared band, or the radio band when no others are configured.
    pub fn reference(&self) -> Option<&ImageBand> {
        self.bands
            .iter()
            .find(|b| !b.kind().is_radio())
            .or_else(|| self.bands.first())
    }

    /// Cutout side length in pixels for an angular size. Halves round to
    /// the even neighbour.
    pub fn cutout_pixels(&self, size_arcsec: f64) -> usize {
        self.reference()
            .map(|band| (size_arcsec / band.scale.x).round_ties_even().max(1.0) as usize)
            .unwrap_or(1)
    }
}
