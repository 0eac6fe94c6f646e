//! Montage Core Library
//!
//! FITS I/O, world coordinate mapping, pixel-scale resolution, cutout
//! extraction, contrast normalization and ellipse overlay geometry for
//! per-source multi-wavelength montages.

pub mod types;
pub mod io;
pub mod wcs;
pub mod scale;
pub mod bands;
pub mod cutout;
pub mod normalize;
pub mod ellipse;

// Re-export commonly used types and functions
pub use types::{BandId, BandIndex, BandKind, SkyCoord, SourceRecord, RADIO_BAND_INDEX};
pub use io::catalog::{Catalog, CatalogError};
pub use io::fits::{FitsError, FitsHeader, FitsImage, HeaderValue};
pub use wcs::{Projection, Wcs, WcsError};
pub use scale::{PixelScale, PixelScaleResolver, ScaleError, ScaleStrategy};
pub use bands::{BandError, BandSet, ImageBand};
pub use cutout::{CoordinateCutoutExtractor, Cutout, CutoutError};
pub use normalize::{ClipBounds, ContrastNormalizer};
pub use ellipse::{EllipseOverlay, EllipseOverlayCalculator, SourceEllipse};

/// Version information for the montage core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
