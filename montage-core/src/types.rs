use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a band in the per-source ordering. Index 0 is always the radio band.
pub type BandIndex = usize;

pub const RADIO_BAND_INDEX: BandIndex = 0;

pub const ARCSEC_PER_DEGREE: f64 = 3600.0;

/// Equatorial sky position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyCoord {
    pub ra: f64,
    pub dec: f64,
}

impl SkyCoord {
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }
}

impl fmt::Display for SkyCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:+.6})", self.ra, self.dec)
    }
}

/// One catalog row. Axis lengths and position angle are kept in the units the
/// catalog stores them in (degrees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub ra: f64,
    pub dec: f64,
    pub major_deg: f64,
    pub minor_deg: f64,
    pub pa_deg: f64,
}

impl SourceRecord {
    pub fn sky_coord(&self) -> SkyCoord {
        SkyCoord::new(self.ra, self.dec)
    }

    pub fn major_arcsec(&self) -> f64 {
        self.major_deg * ARCSEC_PER_DEGREE
    }

    pub fn minor_arcsec(&self) -> f64 {
        self.minor_deg * ARCSEC_PER_DEGREE
    }

    /// Identifier made safe for use inside artifact file names.
    pub fn file_stem(&self) -> String {
        sanitize_id(&self.id)
    }
}

pub fn sanitize_id(id: &str) -> String {
    id.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandKind {
    Radio,
    Optical,
    Infrared,
}

impl BandKind {
    pub fn is_radio(self) -> bool {
        matches!(self, BandKind::Radio)
    }
}

impl fmt::Display for BandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BandKind::Radio => "radio",
            BandKind::Optical => "optical",
            BandKind::Infrared => "infrared",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BandId {
    pub index: BandIndex,
    pub kind: BandKind,
    pub name: String,
}

impl BandId {
    pub fn new(index: BandIndex, kind: BandKind, name: impl Into<String>) -> Self {
        Self { index, kind, name: name.into() }
    }
}

impl fmt::Display for BandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({})", self.index, self.name, self.kind)
    }
}
