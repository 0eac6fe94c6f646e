//! Celestial WCS for zenithal projections
//!
//! Supports the gnomonic (TAN) and orthographic (SIN) projections described by
//! CRVAL/CRPIX plus either a CD matrix or CDELT with PC or CROTA2. Pixel
//! coordinates at this API are zero-based; the header's CRPIX is one-based.

use crate::io::fits::{FitsHeader, HeaderValue};
use crate::types::SkyCoord;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WcsError {
    #[error("Missing WCS keyword {0}")]
    MissingKeyword(&'static str),

    #[error("Unsupported celestial projection '{0}'")]
    UnsupportedProjection(String),

    #[error("Singular pixel transformation matrix")]
    SingularMatrix,

    #[error("Position {0} is not visible in this projection")]
    FarSide(SkyCoord),

    #[error("Pixel ({0:.2}, {1:.2}) lies outside the projection domain")]
    OutsideDomain(f64, f64),
}

pub type Result<T> = std::result::Result<T, WcsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Tan,
    Sin,
}

impl Projection {
    fn from_ctype(ctype: &str) -> Result<Self> {
        let code = ctype.get(5..8).unwrap_or("").trim();
        match code {
            "TAN" => Ok(Projection::Tan),
            "SIN" => Ok(Projection::Sin),
            _ => Err(WcsError::UnsupportedProjection(ctype.to_string())),
        }
    }

    fn code(self) -> &'static str {
        match self {
            Projection::Tan => "TAN",
            Projection::Sin => "SIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wcs {
    /// Reference sky position (degrees).
    pub crval: [f64; 2],
    /// Reference pixel, one-based as in the header.
    pub crpix: [f64; 2],
    /// Degrees of intermediate world coordinate per pixel.
    pub cd: [[f64; 2]; 2],
    pub projection: Projection,
    cd_inv: [[f64; 2]; 2],
}

impl Wcs {
    pub fn new(
        crval: [f64; 2],
        crpix: [f64; 2],
        cd: [[f64; 2]; 2],
        projection: Projection,
    ) -> Result<Self> {
        let det = cd[0][0] * cd[1][1] - cd[0][1] * cd[1][0];
        if det == 0.0 || !det.is_finite() {
            return Err(WcsError::SingularMatrix);
        }
        let cd_inv = [
            [cd[1][1] / det, -cd[0][1] / det],
            [-cd[1][0] / det, cd[0][0] / det],
        ];
        Ok(Self { crval, crpix, cd, projection, cd_inv })
    }

    pub fn from_header(header: &FitsHeader) -> Result<Self> {
        let projection = match header.get_str("CTYPE1") {
            Some(ctype) => Projection::from_ctype(ctype)?,
            None => return Err(WcsError::MissingKeyword("CTYPE1")),
        };

        let req = |key: &'static str| header.get_f64(key).ok_or(WcsError::MissingKeyword(key));
        let crval = [req("CRVAL1")?, req("CRVAL2")?];
        let crpix = [req("CRPIX1")?, req("CRPIX2")?];

        let has_cd = ["CD1_1", "CD1_2", "CD2_1", "CD2_2"]
            .iter()
            .any(|k| header.contains(k));

        let cd = if has_cd {
            let cd = |key| header.get_f64(key).unwrap_or(0.0);
            [[cd("CD1_1"), cd("CD1_2")], [cd("CD2_1"), cd("CD2_2")]]
        } else {
            let cdelt = [req("CDELT1")?, req("CDELT2")?];
            let pc = if let Some(crota) = header.get_f64("CROTA2") {
                let (s, c) = crota.to_radians().sin_cos();
                // CROTA2 mixes CDELT ratios into the off-diagonal terms
                [
                    [c, -s * cdelt[1] / cdelt[0]],
                    [s * cdelt[0] / cdelt[1], c],
                ]
            } else {
                let pc = |key, default| header.get_f64(key).unwrap_or(default);
                [
                    [pc("PC1_1", 1.0), pc("PC1_2", 0.0)],
                    [pc("PC2_1", 0.0), pc("PC2_2", 1.0)],
                ]
            };
            [
                [cdelt[0] * pc[0][0], cdelt[0] * pc[0][1]],
                [cdelt[1] * pc[1][0], cdelt[1] * pc[1][1]],
            ]
        };

        Self::new(crval, crpix, cd, projection)
    }

    /// Zero-based pixel position `(x, y)` of a sky coordinate.
    pub fn world_to_pixel(&self, coord: SkyCoord) -> Result<(f64, f64)> {
        let (ra0, dec0) = (self.crval[0].to_radians(), self.crval[1].to_radians());
        let (ra, dec) = (coord.ra.to_radians(), coord.dec.to_radians());
        let dra = ra - ra0;

        let cos_c = dec0.sin() * dec.sin() + dec0.cos() * dec.cos() * dra.cos();
        let xi = dec.cos() * dra.sin();
        let eta = dec0.cos() * dec.sin() - dec0.sin() * dec.cos() * dra.cos();

        let (xi, eta) = match self.projection {
            Projection::Tan => {
                if cos_c <= 0.0 {
                    return Err(WcsError::FarSide(coord));
                }
                (xi / cos_c, eta / cos_c)
            }
            Projection::Sin => {
                if cos_c < 0.0 {
                    return Err(WcsError::FarSide(coord));
                }
                (xi, eta)
            }
        };

        let (x, y) = (xi.to_degrees(), eta.to_degrees());
        let m = &self.cd_inv;
        let dx = m[0][0] * x + m[0][1] * y;
        let dy = m[1][0] * x + m[1][1] * y;
        Ok((self.crpix[0] + dx - 1.0, self.crpix[1] + dy - 1.0))
    }

    /// Sky coordinate of a zero-based pixel position.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> Result<SkyCoord> {
        let dx = x + 1.0 - self.crpix[0];
        let dy = y + 1.0 - self.crpix[1];
        let xi = (self.cd[0][0] * dx + self.cd[0][1] * dy).to_radians();
        let eta = (self.cd[1][0] * dx + self.cd[1][1] * dy).to_radians();

        let (ra0, dec0) = (self.crval[0].to_radians(), self.crval[1].to_radians());
        let rho = xi.hypot(eta);
        if rho == 0.0 {
            return Ok(SkyCoord::new(self.crval[0], self.crval[1]));
        }

        let c = match self.projection {
            Projection::Tan => rho.atan(),
            Projection::Sin => {
                if rho > 1.0 {
                    return Err(WcsError::OutsideDomain(x, y));
                }
                rho.asin()
            }
        };
        let (sin_c, cos_c) = c.sin_cos();

        let dec = (cos_c * dec0.sin() + eta * sin_c * dec0.cos() / rho).asin();
        let ra = ra0
            + (xi * sin_c).atan2(rho * dec0.cos() * cos_c - eta * dec0.sin() * sin_c);

        Ok(SkyCoord::new(ra.to_degrees().rem_euclid(360.0), dec.to_degrees()))
    }

    /// Same mapping expressed for a sub-image whose pixel (0, 0) sits at
    /// `(x0, y0)` of this one.
    pub fn offset(&self, x0: f64, y0: f64) -> Self {
        let mut shifted = self.clone();
        shifted.crpix = [self.crpix[0] - x0, self.crpix[1] - y0];
        shifted
    }

    /// Write the mapping as CD-matrix keywords.
    pub fn write_header(&self, header: &mut FitsHeader) {
        let code = self.projection.code();
        header.set("CTYPE1", HeaderValue::String(format!("RA---{}", code)));
        header.set("CTYPE2", HeaderValue::String(format!("DEC--{}", code)));
        header.set("CRVAL1", HeaderValue::Float(self.crval[0]));
        header.set("CRVAL2", HeaderValue::Float(self.crval[1]));
        header.set("CRPIX1", HeaderValue::Float(self.crpix[0]));
        header.set("CRPIX2", HeaderValue::Float(self.crpix[1]));
        header.set("CD1_1", HeaderValue::Float(self.cd[0][0]));
        header.set("CD1_2", HeaderValue::Float(self.cd[0][1]));
        header.set("CD2_1", HeaderValue::Float(self.cd[1][0]));
        header.set("CD2_2", HeaderValue::Float(self.cd[1][1]));
        for key in ["CDELT1", "CDELT2", "CROTA2", "PC1_1", "PC1_2", "PC2_1", "PC2_2"] {
            header.remove(key);
        }
    }
}
