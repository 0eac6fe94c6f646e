//! FITS primary-HDU reader and writer
//!
//! Images go through cfitsio via the `fitsio` crate, which applies
//! BSCALE/BZERO on read. Only the first 2-D plane of the primary data unit
//! is kept. Rows of the returned array follow FITS storage order, so row 0
//! is the bottom row of the image as conventionally displayed.

use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::images::{ImageDescription, ImageType};
use fitsio::FitsFile;
use ndarray::Array2;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// cfitsio keeps process-wide file tables; calls are serialized through this.
static CFITSIO: Mutex<()> = Mutex::new(());

fn cfitsio_lock() -> MutexGuard<'static, ()> {
    CFITSIO.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keywords carried as text.
const STRING_KEYWORDS: &[&str] = &[
    "CTYPE1", "CTYPE2", "CUNIT1", "CUNIT2", "RADESYS", "BUNIT", "OBJECT", "TELESCOP",
    "INSTRUME", "BAND",
];

/// Keywords carried as integers.
const INTEGER_KEYWORDS: &[&str] = &[
    "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "NAXIS3", "NAXIS4", "BLANK",
];

/// Keywords carried as reals.
const FLOAT_KEYWORDS: &[&str] = &[
    "CRVAL1", "CRVAL2", "CRPIX1", "CRPIX2", "CDELT1", "CDELT2", "CROTA2", "CD1_1", "CD1_2",
    "CD2_1", "CD2_2", "PC1_1", "PC1_2", "PC2_1", "PC2_2", "D001SCAL", "BSCALE", "BZERO",
    "EQUINOX",
];

/// Keywords cfitsio writes itself; copies from a source header are skipped.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "SIMPLE", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "NAXIS3", "NAXIS4", "EXTEND", "BSCALE",
    "BZERO", "BLANK", "END",
];

#[derive(Debug, Error)]
pub enum FitsError {
    #[error("FITS I/O error: {0}")]
    Fitsio(#[from] fitsio::errors::Error),

    #[error("Primary HDU is not an image")]
    NotImage,

    #[error("Missing required keyword {0}")]
    MissingKeyword(String),

    #[error("Unsupported NAXIS={0}: expected a 2-D to 4-D image")]
    UnsupportedDimensions(i64),

    #[error("Invalid axis length {keyword}={value}")]
    InvalidAxis { keyword: String, value: i64 },

    #[error("Data unit truncated: expected {expected} values, got {found}")]
    Truncated { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, FitsError>;

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Integer(i64),
    Float(f64),
    String(String),
}

impl HeaderValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Integer(v) => Some(*v as f64),
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::String(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(v) => Some(*v),
            HeaderValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Keyword view over the header cards montage reads and writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitsHeader {
    cards: Vec<(String, HeaderValue)>,
}

impl FitsHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.cards
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v)
    }

    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(HeaderValue::as_f64)
    }

    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(HeaderValue::as_i64)
    }

    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(HeaderValue::as_str)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    /// Set a keyword, replacing an existing card in place.
    pub fn set(&mut self, keyword: impl Into<String>, value: HeaderValue) {
        let keyword = keyword.into().to_ascii_uppercase();
        if let Some(card) = self.cards.iter_mut().find(|(k, _)| *k == keyword) {
            card.1 = value;
        } else {
            self.cards.push((keyword, value));
        }
    }

    pub fn remove(&mut self, keyword: &str) {
        self.cards.retain(|(k, _)| k != keyword);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.cards.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn required_i64(&self, keyword: &str) -> Result<i64> {
        self.get_i64(keyword)
            .ok_or_else(|| FitsError::MissingKeyword(keyword.to_string()))
    }

    /// Collect every known keyword present on the HDU.
    fn read_from(hdu: &FitsHdu, fptr: &mut FitsFile) -> Self {
        let mut header = FitsHeader::new();
        for key in INTEGER_KEYWORDS {
            if let Some(v) = read_key_optional::<i64>(hdu, fptr, key) {
                header.set(*key, HeaderValue::Integer(v));
            }
        }
        for key in FLOAT_KEYWORDS {
            if let Some(v) = read_key_optional::<f64>(hdu, fptr, key) {
                header.set(*key, HeaderValue::Float(v));
            }
        }
        for key in STRING_KEYWORDS {
            if let Some(v) = read_key_optional::<String>(hdu, fptr, key) {
                header.set(*key, HeaderValue::String(v.trim_end().to_string()));
            }
        }
        header
    }

    fn write_to(&self, hdu: &FitsHdu, fptr: &mut FitsFile) -> Result<()> {
        for (keyword, value) in self.iter() {
            if STRUCTURAL_KEYWORDS.contains(&keyword) {
                continue;
            }
            match value {
                HeaderValue::Integer(v) => hdu.write_key(fptr, keyword, *v)?,
                HeaderValue::Float(v) => hdu.write_key(fptr, keyword, *v)?,
                HeaderValue::String(s) => hdu.write_key(fptr, keyword, s.as_str())?,
            }
        }
        Ok(())
    }
}

fn read_key_optional<T: fitsio::headers::ReadsKey>(
    hdu: &FitsHdu,
    fptr: &mut FitsFile,
    key: &str,
) -> Option<T> {
    hdu.read_key(fptr, key).ok()
}

/// A primary image: header, original axis lengths and the first 2-D plane.
#[derive(Debug, Clone)]
pub struct FitsImage {
    pub header: FitsHeader,
    /// NAXISn values in header order (NAXIS1 first).
    pub axes: Vec<usize>,
    /// Physical values indexed `[row, column]`.
    pub data: Array2<f64>,
}

impl FitsImage {
    pub fn new(header: FitsHeader, data: Array2<f64>) -> Self {
        let (rows, cols) = data.dim();
        Self { header, axes: vec![cols, rows], data }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let _guard = cfitsio_lock();
        let mut fptr = FitsFile::open(path.as_ref())?;
        let hdu = fptr.primary_hdu()?;
        if !matches!(hdu.info, HduInfo::ImageInfo { .. }) {
            return Err(FitsError::NotImage);
        }

        let header = FitsHeader::read_from(&hdu, &mut fptr);
        let naxis = header.required_i64("NAXIS")?;
        if !(2..=4).contains(&naxis) {
            return Err(FitsError::UnsupportedDimensions(naxis));
        }

        let mut axes = Vec::with_capacity(naxis as usize);
        for n in 1..=naxis {
            let keyword = format!("NAXIS{}", n);
            let value = header.required_i64(&keyword)?;
            if value <= 0 {
                return Err(FitsError::InvalidAxis { keyword, value });
            }
            axes.push(value as usize);
        }

        let (width, height) = (axes[0], axes[1]);
        let count = width * height;
        let mut values: Vec<f64> = hdu.read_image(&mut fptr)?;
        if values.len() < count {
            return Err(FitsError::Truncated { expected: count, found: values.len() });
        }
        values.truncate(count);

        // cfitsio hands back scaled values without null checks, so BLANK
        // pixels arrive as BZERO + BSCALE * BLANK
        let bitpix = header.get_i64("BITPIX").unwrap_or(-64);
        if let (true, Some(blank)) = (bitpix > 0, header.get_f64("BLANK")) {
            let bscale = header.get_f64("BSCALE").unwrap_or(1.0);
            let bzero = header.get_f64("BZERO").unwrap_or(0.0);
            let null = bzero + bscale * blank;
            values.iter_mut().filter(|v| **v == null).for_each(|v| *v = f64::NAN);
        }

        let data = Array2::from_shape_vec((height, width), values)
            .map_err(|_| FitsError::Truncated { expected: count, found: 0 })?;

        if axes.len() > 2 {
            log::debug!("image has {} axes {:?}, using first plane", axes.len(), axes);
        }

        Ok(Self { header, axes, data })
    }

    /// Width in pixels (NAXIS1).
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// Height in pixels (NAXIS2).
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Write as a BITPIX=-64 2-D primary HDU, carrying over non-structural
    /// keywords. An existing file is replaced.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let (rows, cols) = self.data.dim();
        let description = ImageDescription {
            data_type: ImageType::Double,
            dimensions: &[rows, cols],
        };
        let _guard = cfitsio_lock();
        let mut fptr = FitsFile::create(path.as_ref())
            .with_custom_primary(&description)
            .overwrite()
            .open()?;
        let hdu = fptr.primary_hdu()?;

        let flat: Vec<f64> = self.data.iter().copied().collect();
        hdu.write_image(&mut fptr, &flat)?;
        self.header.write_to(&hdu, &mut fptr)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_header_value_conversions() {
        assert_eq!(HeaderValue::Integer(-32).as_f64(), Some(-32.0));
        assert_eq!(HeaderValue::Float(4.0).as_i64(), Some(4));
        assert_eq!(HeaderValue::Float(4.5).as_i64(), None);
        assert_eq!(HeaderValue::String("RA---TAN".into()).as_str(), Some("RA---TAN"));
        assert_eq!(HeaderValue::String("RA---TAN".into()).as_f64(), None);
    }

    #[test]
    fn test_header_set_replaces_in_place() {
        let mut h = FitsHeader::new();
        h.set("cdelt1", HeaderValue::Float(1.0));
        h.set("CDELT2", HeaderValue::Float(2.0));
        h.set("CDELT1", HeaderValue::Float(3.0));
        assert_eq!(h.len(), 2);
        assert_eq!(h.iter().next(), Some(("CDELT1", &HeaderValue::Float(3.0))));
        h.remove("CDELT1");
        assert!(!h.contains("CDELT1"));
    }

    #[test]
    fn test_written_file_reads_back_with_keywords() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.fits");

        let mut header = FitsHeader::new();
        header.set("CTYPE1", HeaderValue::String("RA---TAN".into()));
        header.set("CDELT1", HeaderValue::Float(-2.5e-5));
        header.set("BITPIX", HeaderValue::Integer(16));
        let image = FitsImage::new(header, array![[1.0, 2.0, 3.0], [4.0, f64::NAN, 6.0]]);
        image.save(&path).unwrap();

        let back = FitsImage::open(&path).unwrap();
        assert_eq!(back.header.get_i64("BITPIX"), Some(-64));
        assert_eq!(back.header.get_str("CTYPE1"), Some("RA---TAN"));
        assert_eq!(back.header.get_f64("CDELT1"), Some(-2.5e-5));
        assert_eq!(back.axes, vec![3, 2]);
        assert_eq!(back.data.dim(), (2, 3));
        assert_eq!(back.data[[0, 1]], 2.0);
        assert_eq!(back.data[[1, 2]], 6.0);
        assert!(back.data[[1, 1]].is_nan());
    }

    #[test]
    fn test_integer_blank_reads_as_nan() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blank.fits");
        {
            let _guard = cfitsio_lock();
            let description = ImageDescription {
                data_type: ImageType::Long,
                dimensions: &[2, 2],
            };
            let mut fptr = FitsFile::create(&path)
                .with_custom_primary(&description)
                .open()
                .unwrap();
            let hdu = fptr.primary_hdu().unwrap();
            hdu.write_image(&mut fptr, &[1i32, -99, 3, 4]).unwrap();
            hdu.write_key(&mut fptr, "BLANK", -99i64).unwrap();
        }

        let image = FitsImage::open(&path).unwrap();
        assert_eq!(image.header.get_i64("BITPIX"), Some(32));
        assert_eq!(image.data[[0, 0]], 1.0);
        assert!(image.data[[0, 1]].is_nan());
        assert_eq!(image.data[[1, 1]], 4.0);
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.fits");
        FitsImage::new(FitsHeader::new(), Array2::zeros((4, 4))).save(&path).unwrap();
        FitsImage::new(FitsHeader::new(), Array2::ones((2, 2))).save(&path).unwrap();

        let back = FitsImage::open(&path).unwrap();
        assert_eq!(back.data, Array2::<f64>::ones((2, 2)));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(matches!(
            FitsImage::open("/nonexistent/radio.fits"),
            Err(FitsError::Fitsio(_))
        ));
    }
}
