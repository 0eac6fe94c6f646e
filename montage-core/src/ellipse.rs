//! Source ellipse overlay geometry
//!
//! Converts catalog axis lengths and position angle into a pixel-space
//! ellipse centred on the cutout. Both axes use the x pixel scale.

use crate::scale::PixelScale;
use crate::types::SourceRecord;

/// Axes smaller than this are drawn at this size so the marker stays visible.
pub const MIN_AXIS_ARCSEC: f64 = 1.0;

/// Catalog PA is measured from north; the overlay angle is measured from +x.
pub const PA_OFFSET_DEG: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceEllipse {
    pub major_arcsec: f64,
    pub minor_arcsec: f64,
    pub pa_deg: f64,
}

impl SourceEllipse {
    pub fn from_record(record: &SourceRecord) -> Self {
        Self {
            major_arcsec: record.major_arcsec(),
            minor_arcsec: record.minor_arcsec(),
            pa_deg: record.pa_deg,
        }
    }
}

/// Pixel-space ellipse: full axis lengths, angle counter-clockwise from +x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseOverlay {
    pub center: (f64, f64),
    pub width: f64,
    pub height: f64,
    pub angle_deg: f64,
}

impl EllipseOverlay {
    /// `segments` points on the boundary, in the cutout's pixel frame.
    pub fn boundary(&self, segments: usize) -> Vec<(f64, f64)> {
        let (sin_t, cos_t) = self.angle_deg.to_radians().sin_cos();
        let (a, b) = (self.width / 2.0, self.height / 2.0);
        (0..segments)
            .map(|i| {
                let t = std::f64::consts::TAU * i as f64 / segments as f64;
                let (ex, ey) = (a * t.cos(), b * t.sin());
                (
                    self.center.0 + ex * cos_t - ey * sin_t,
                    self.center.1 + ex * sin_t + ey * cos_t,
                )
            })
            .collect()
    }
}

pub struct EllipseOverlayCalculator;

impl EllipseOverlayCalculator {
    /// Overlay for a cutout frame of `size` pixels per side.
    pub fn overlay(ellipse: &SourceEllipse, scale: &PixelScale, size: usize) -> EllipseOverlay {
        let major = ellipse.major_arcsec.max(MIN_AXIS_ARCSEC);
        let minor = ellipse.minor_arcsec.max(MIN_AXIS_ARCSEC);
        let half = size as f64 / 2.0;
        EllipseOverlay {
            center: (half, half),
            width: major / scale.x,
            height: minor / scale.x,
            angle_deg: ellipse.pa_deg + PA_OFFSET_DEG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axes_floor_and_scale() {
        let ellipse = SourceEllipse { major_arcsec: 4.0, minor_arcsec: 0.2, pa_deg: 30.0 };
        let overlay =
            EllipseOverlayCalculator::overlay(&ellipse, &PixelScale::new(0.1, 0.5), 100);
        assert_eq!(overlay.center, (50.0, 50.0));
        assert!((overlay.width - 40.0).abs() < 1e-9);
        // floored to 1", still divided by the x scale
        assert!((overlay.height - 10.0).abs() < 1e-9);
        assert_eq!(overlay.angle_deg, 120.0);
    }

    #[test]
    fn test_from_record_converts_degrees() {
        let record = SourceRecord {
            id: "s".into(),
            ra: 0.0,
            dec: 0.0,
            major_deg: 0.001,
            minor_deg: 0.0005,
            pa_deg: -15.0,
        };
        let ellipse = SourceEllipse::from_record(&record);
        assert!((ellipse.major_arcsec - 3.6).abs() < 1e-12);
        assert!((ellipse.minor_arcsec - 1.8).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_rotation() {
        let overlay = EllipseOverlay { center: (0.0, 0.0), width: 4.0, height: 2.0, angle_deg: 90.0 };
        let pts = overlay.boundary(4);
        // major axis end rotated onto +y
        assert!(pts[0].0.abs() < 1e-9 && (pts[0].1 - 2.0).abs() < 1e-9);
        assert!((pts[1].0 + 1.0).abs() < 1e-9 && pts[1].1.abs() < 1e-9);
    }
}
