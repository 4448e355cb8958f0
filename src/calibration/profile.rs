// CalibrationProfile - per-channel dark offset, gain and centroid table
//
// One profile is owned per sensing channel. It starts from the built-in
// reference table (or persisted storage) and is only mutated by the
// calibration workflow or the explicit copy operation.
//
// Default references are 16-bit sensor counts taken with the illumination LED
// on and clear-channel normalization active.

use serde::{Deserialize, Serialize};

use crate::color::{ColorPalette, Rgb, SlotIndex};
use crate::error::CalibrationError;

/// Built-in reference values, looked up by slot name
const DEFAULT_REFERENCES: &[(&str, Rgb)] = &[
    ("LightBlue", Rgb::new(15596.0, 26298.0, 23352.0)),
    ("Blue", Rgb::new(15596.0, 26298.0, 23352.0)),
    ("Orange", Rgb::new(38714.0, 7259.0, 17264.0)),
    ("Pink", Rgb::new(29661.0, 14660.0, 20216.0)),
    ("Yellow", Rgb::new(28083.0, 26337.0, 8616.0)),
    ("Green", Rgb::new(15202.0, 35000.0, 13116.0)),
    ("Red", Rgb::new(47706.0, 11395.0, 9411.0)),
    ("Black", Rgb::new(21300.0, 21900.0, 21100.0)),
    ("DarkBlue", Rgb::new(11800.0, 21400.0, 31600.0)),
    ("Purple", Rgb::new(26269.0, 19172.0, 20256.0)),
    ("Brown", Rgb::new(34588.0, 20049.0, 9354.0)),
    ("White", Rgb::new(24491.0, 24725.0, 13963.0)),
];

/// Built-in reference for a slot name, if one exists
pub fn default_reference(name: &str) -> Option<Rgb> {
    DEFAULT_REFERENCES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, reference)| *reference)
}

/// A labeled reference point in calibrated-sample units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorCentroid {
    /// Position in the centroid table
    pub index: SlotIndex,
    pub name: String,
    pub reference: Rgb,
}

/// Calibration data for one sensing channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    /// Baseline reading with no target and illumination off
    pub dark_offset: Rgb,
    /// Per-channel multipliers equalizing the three color responses
    pub gain: Rgb,
    /// Rescale by the clear channel to remove brightness variation
    pub normalize: bool,
    /// Ordered centroid table, one entry per palette slot
    pub centroids: Vec<ColorCentroid>,
    /// Whether any calibration step has been applied
    #[serde(default)]
    pub is_calibrated: bool,
}

impl CalibrationProfile {
    /// Create the default profile for a palette
    ///
    /// Slots whose name has no built-in reference start at the zero triple
    /// until calibrated.
    pub fn default_for(palette: &ColorPalette) -> Self {
        let centroids = palette
            .names()
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let reference = default_reference(name).unwrap_or_else(|| {
                    log::debug!("[Calibration] No built-in reference for {:?}", name);
                    Rgb::ZERO
                });
                ColorCentroid {
                    index,
                    name: name.clone(),
                    reference,
                }
            })
            .collect();

        Self {
            dark_offset: Rgb::ZERO,
            gain: Rgb::splat(1.0),
            normalize: true,
            centroids,
            is_calibrated: false,
        }
    }

    pub fn set_dark_offset(&mut self, dark: Rgb) {
        self.dark_offset = dark;
        self.is_calibrated = true;
    }

    /// Recompute all three gains from one white reference triple
    ///
    /// The dark offset is subtracted first; gain_c = mean(white') / white'_c so
    /// every channel reports the common average for the reference surface. A
    /// channel with no response keeps unit gain.
    pub fn set_white_reference(&mut self, white: Rgb) {
        let corrected = white.zip_with(self.dark_offset, |value, dark| (value - dark).max(0.0));
        let average = corrected.mean();

        self.gain = corrected.map(|value| if value > 0.0 { average / value } else { 1.0 });
        self.is_calibrated = true;
    }

    /// Overwrite the reference of one centroid
    ///
    /// # Errors
    /// `CalibrationError::InvalidSlot` when `slot` is outside the table.
    pub fn set_centroid(&mut self, slot: SlotIndex, reference: Rgb) -> Result<(), CalibrationError> {
        let slot_count = self.centroids.len();
        let centroid = self
            .centroids
            .get_mut(slot)
            .ok_or(CalibrationError::InvalidSlot { slot, slot_count })?;

        centroid.reference = reference;
        self.is_calibrated = true;
        Ok(())
    }

    /// Copy dark offset, gain, normalize flag and centroid table from another profile
    pub fn copy_calibration_from(&mut self, source: &CalibrationProfile) {
        self.dark_offset = source.dark_offset;
        self.gain = source.gain;
        self.normalize = source.normalize;
        self.centroids = source.centroids.clone();
        self.is_calibrated = source.is_calibrated;
    }

    /// True when the centroid table lines up with the palette slot for slot
    pub fn matches_palette(&self, palette: &ColorPalette) -> bool {
        self.centroids.len() == palette.len()
            && self
                .centroids
                .iter()
                .enumerate()
                .all(|(i, c)| c.index == i && palette.name(i) == Some(c.name.as_str()))
    }

    pub fn slot_count(&self) -> usize {
        self.centroids.len()
    }
}
