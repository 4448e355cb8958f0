// SampleNormalizer - raw sensor counts to calibrated color triple
//
// Per channel: subtract the dark offset (floored at zero) and scale by the
// channel gain. When the profile asks for brightness normalization and the
// clear channel saw light, all three channels are rescaled by
// clear_full_scale / clear so the same surface reads the same under
// different illumination.

use crate::calibration::CalibrationProfile;
use crate::color::{CalibratedSample, RawSample, Rgb};

/// Full-scale count of the clear channel on a 16-bit sensor
pub const DEFAULT_CLEAR_FULL_SCALE: f32 = 65535.0;

/// Converts raw readings into calibrated samples for one instrument
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleNormalizer {
    clear_full_scale: f32,
}

impl SampleNormalizer {
    pub fn new(clear_full_scale: f32) -> Self {
        Self { clear_full_scale }
    }

    pub fn clear_full_scale(&self) -> f32 {
        self.clear_full_scale
    }

    /// Apply dark offset, gain and optional clear-channel normalization
    ///
    /// Never fails; every output channel is non-negative.
    pub fn normalize(&self, raw: &RawSample, profile: &CalibrationProfile) -> CalibratedSample {
        let gained = raw
            .rgb()
            .zip_with(profile.dark_offset, |value, dark| (value - dark).max(0.0))
            .zip_with(profile.gain, |value, gain| value * gain);

        if profile.normalize && raw.clear != 0 {
            let scale = self.clear_full_scale / raw.clear as f32;
            gained.map(|value| value * scale)
        } else {
            gained
        }
    }

    /// Normalize a reading that may be missing
    ///
    /// An unavailable sensor yields the zero triple.
    pub fn normalize_reading(
        &self,
        reading: Option<RawSample>,
        profile: &CalibrationProfile,
    ) -> CalibratedSample {
        match reading {
            Some(raw) => self.normalize(&raw, profile),
            None => Rgb::ZERO,
        }
    }
}

impl Default for SampleNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CLEAR_FULL_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorPalette;

    fn profile(dark: Rgb, gain: Rgb, normalize: bool) -> CalibrationProfile {
        let mut profile = CalibrationProfile::default_for(&ColorPalette::standard());
        profile.dark_offset = dark;
        profile.gain = gain;
        profile.normalize = normalize;
        profile
    }

    #[test]
    fn test_identity_profile_passes_counts_through() {
        let normalizer = SampleNormalizer::default();
        let p = profile(Rgb::ZERO, Rgb::splat(1.0), false);

        let sample = normalizer.normalize(&RawSample::new(100, 200, 300, 1000), &p);
        assert_eq!(sample, Rgb::new(100.0, 200.0, 300.0));
    }

    #[test]
    fn test_dark_offset_floors_at_zero() {
        let normalizer = SampleNormalizer::default();
        let p = profile(Rgb::new(50.0, 250.0, 10.0), Rgb::splat(1.0), false);

        let sample = normalizer.normalize(&RawSample::new(100, 200, 300, 1000), &p);
        assert_eq!(sample, Rgb::new(50.0, 0.0, 290.0));
    }

    #[test]
    fn test_gain_applied_after_dark() {
        let normalizer = SampleNormalizer::default();
        let p = profile(Rgb::splat(10.0), Rgb::new(2.0, 0.5, 1.0), false);

        let sample = normalizer.normalize(&RawSample::new(110, 210, 310, 1000), &p);
        assert_eq!(sample, Rgb::new(200.0, 100.0, 300.0));
    }

    #[test]
    fn test_clear_normalization_removes_brightness() {
        let normalizer = SampleNormalizer::new(1000.0);
        let p = profile(Rgb::ZERO, Rgb::splat(1.0), true);

        let dim = normalizer.normalize(&RawSample::new(100, 50, 25, 500), &p);
        let bright = normalizer.normalize(&RawSample::new(200, 100, 50, 1000), &p);

        assert_eq!(dim, Rgb::new(200.0, 100.0, 50.0));
        assert_eq!(dim, bright);
    }

    #[test]
    fn test_zero_clear_skips_normalization() {
        let normalizer = SampleNormalizer::new(1000.0);
        let p = profile(Rgb::ZERO, Rgb::splat(1.0), true);

        let sample = normalizer.normalize(&RawSample::new(7, 8, 9, 0), &p);
        assert_eq!(sample, Rgb::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn test_unavailable_sensor_yields_zero() {
        let normalizer = SampleNormalizer::default();
        let p = profile(Rgb::ZERO, Rgb::splat(1.0), true);

        assert_eq!(normalizer.normalize_reading(None, &p), Rgb::ZERO);
    }
}
