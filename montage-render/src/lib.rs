//! Montage Render Library
//!
//! Turns normalized cutouts into panel pages, crops them into thumbnails,
//! joins thumbnails into per-source strips and lays strips out on report
//! pages. Pages are rasters with vector text annotations, exported as PDF.

pub mod error;
pub mod style;
pub mod page;
pub mod raster;
pub mod panel;
pub mod thumbnail;
pub mod strip;
pub mod paginate;
pub mod store;

pub use error::{RenderError, Result};
pub use style::{parse_hex_rgb, RenderStyle};
pub use page::{Page, PdfWriter, TextAnnotation};
pub use panel::PanelRenderer;
pub use thumbnail::{CropBox, PageCropResizeLabeler, THUMBNAIL_DPI};
pub use strip::RowCompositor;
pub use paginate::{PageGridPaginator, ReportPage};
pub use store::{cutout_name, report_page_name, ArtifactKey, ArtifactStore, Stage};
