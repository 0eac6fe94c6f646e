//! Sigma-clipped contrast normalization
//!
//! Bounds are `lower = 0.05 * (mean - std)` and `upper = mean + k * std`,
//! with `k = 3` for optical and infrared bands and `k = 5` for radio. Values
//! are clamped to the bounds and rescaled to `[0, 1]`. Statistics use only
//! finite pixels; non-finite pixels stay NaN in the output.

use crate::types::BandKind;
use ndarray::Array2;

pub const OPTICAL_CLIP: f64 = 3.0;
pub const RADIO_CLIP: f64 = 5.0;
const LOWER_FRACTION: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipBounds {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastNormalizer {
    multiplier: f64,
}

impl ContrastNormalizer {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    pub fn for_band(kind: BandKind) -> Self {
        match kind {
            BandKind::Radio => Self::new(RADIO_CLIP),
            BandKind::Optical | BandKind::Infrared => Self::new(OPTICAL_CLIP),
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Clip bounds, or `None` when the array holds no finite values.
    pub fn bounds(&self, data: &Array2<f64>) -> Option<ClipBounds> {
        let stats = Stats::of(data)?;
        let (lower, upper) = stats.scaled_bounds(self.multiplier);
        Some(ClipBounds {
            lower: lower * stats.scale,
            upper: upper * stats.scale,
        })
    }

    pub fn normalize(&self, data: &Array2<f64>) -> Array2<f64> {
        let Some(stats) = Stats::of(data) else {
            return data.mapv(|_| f64::NAN);
        };

        // Bounds and pixels are both in units of the peak magnitude
        let (lower, upper) = stats.scaled_bounds(self.multiplier);
        let range = upper - lower;
        if !(range.is_finite() && range > 0.0) {
            log::debug!("degenerate clip bounds [{}, {}]", lower, upper);
            return data.mapv(|v| if v.is_finite() { 0.0 } else { f64::NAN });
        }

        data.mapv(|v| {
            if v.is_finite() {
                ((v / stats.scale).clamp(lower, upper) - lower) / range
            } else {
                f64::NAN
            }
        })
    }
}

/// Mean and standard deviation of the finite pixels, in units of `scale`.
struct Stats {
    scale: f64,
    mean: f64,
    std: f64,
}

impl Stats {
    fn of(data: &Array2<f64>) -> Option<Self> {
        let peak = data
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0).max(v.abs())))?;
        let scale = if peak > 0.0 { peak } else { 1.0 };

        // Welford
        let mut count = 0usize;
        let mut mean = 0.0;
        let mut m2 = 0.0;
        for v in data.iter().filter(|v| v.is_finite()).map(|v| v / scale) {
            count += 1;
            let delta = v - mean;
            mean += delta / count as f64;
            m2 += delta * (v - mean);
        }
        let var = (m2 / count as f64).max(0.0);
        Some(Self { scale, mean, std: var.sqrt() })
    }

    fn scaled_bounds(&self, multiplier: f64) -> (f64, f64) {
        (
            LOWER_FRACTION * (self.mean - self.std),
            self.mean + multiplier * self.std,
        )
    }
}
