//! File format I/O for montage inputs
//!
//! FITS primary HDUs for the image bands and the CSV source catalog.

pub mod fits;
pub mod catalog;

pub use fits::{FitsError, FitsHeader, FitsImage, HeaderValue};
pub use catalog::{Catalog, CatalogError};
