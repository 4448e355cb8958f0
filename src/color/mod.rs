// Color module - sensor samples, color palette and brightness normalization
//
// A sensor read produces a RawSample (four unsigned counts). The normalizer
// turns it into a calibrated Rgb triple using the channel's CalibrationProfile,
// and the palette names the fixed color slots that every per-slot table
// (centroids, scale steps) is indexed by.

pub mod normalizer;
pub mod palette;

pub use normalizer::{SampleNormalizer, DEFAULT_CLEAR_FULL_SCALE};
pub use palette::{ColorPalette, SlotIndex, MAX_COLOR_SLOTS};

use serde::{Deserialize, Serialize};

/// One photometric sensor read: red, green, blue and clear-intensity counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawSample {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub clear: u16,
}

impl RawSample {
    pub fn new(red: u16, green: u16, blue: u16, clear: u16) -> Self {
        Self {
            red,
            green,
            blue,
            clear,
        }
    }

    /// The three color channels as an unprocessed triple
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.red as f32, self.green as f32, self.blue as f32)
    }
}

/// Real-valued color triple
///
/// Used for calibrated samples, centroid references, dark offsets and gains;
/// all of them live in the same units as a calibrated sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Brightness-normalized sample produced by [`SampleNormalizer`]
pub type CalibratedSample = Rgb;

impl Rgb {
    pub const ZERO: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Same value on all three channels
    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    /// Squared Euclidean distance (no sqrt, callers only compare)
    pub fn distance_squared(&self, other: &Rgb) -> f32 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        dr * dr + dg * dg + db * db
    }

    pub fn mean(&self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }

    pub fn map(self, f: impl Fn(f32) -> f32) -> Rgb {
        Rgb::new(f(self.r), f(self.g), f(self.b))
    }

    pub fn zip_with(self, other: Rgb, f: impl Fn(f32, f32) -> f32) -> Rgb {
        Rgb::new(f(self.r, other.r), f(self.g, other.g), f(self.b, other.b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_squared() {
        let a = Rgb::new(1.0, 2.0, 3.0);
        let b = Rgb::new(4.0, 6.0, 3.0);
        assert_eq!(a.distance_squared(&b), 25.0);
        assert_eq!(a.distance_squared(&a), 0.0);
    }

    #[test]
    fn test_raw_sample_rgb_drops_clear() {
        let raw = RawSample::new(10, 20, 30, 400);
        assert_eq!(raw.rgb(), Rgb::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn test_zip_with() {
        let value = Rgb::new(10.0, 5.0, 1.0).zip_with(Rgb::splat(3.0), |v, d| (v - d).max(0.0));
        assert_eq!(value, Rgb::new(7.0, 2.0, 0.0));
    }
}
