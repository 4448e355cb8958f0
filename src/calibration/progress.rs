// Progress tracking for calibration workflow
//
// This module provides the calibration target selector and the progress
// snapshot reported to the display after every sampling iteration.

use serde::{Deserialize, Serialize};

use crate::color::SlotIndex;

/// What a calibration run measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "slot", rename_all = "snake_case")]
pub enum CalibrationTarget {
    /// Baseline with illumination off and no target present
    DarkOffset,
    /// White/gray reference used to derive channel gains
    WhiteReference,
    /// Centroid for one color slot
    Color(SlotIndex),
}

impl CalibrationTarget {
    /// Whether samples are raw triples (reference runs) or calibrated ones
    pub fn uses_raw_samples(&self) -> bool {
        !matches!(self, CalibrationTarget::Color(_))
    }

    /// Whether the sensor's illumination must be off while sampling
    pub fn needs_dark(&self) -> bool {
        matches!(self, CalibrationTarget::DarkOffset)
    }

    /// Get human-readable name for display
    pub fn display_name(&self) -> String {
        match self {
            CalibrationTarget::DarkOffset => "DARK".to_string(),
            CalibrationTarget::WhiteReference => "WHITE".to_string(),
            CalibrationTarget::Color(slot) => format!("COLOR {}", slot),
        }
    }
}

/// Progress information for the current calibration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationProgress {
    /// Target being calibrated
    pub target: CalibrationTarget,
    /// Number of samples accumulated so far (0..=samples_needed)
    pub samples_collected: usize,
    /// Total samples the run takes
    pub samples_needed: usize,
}

impl CalibrationProgress {
    pub fn new(target: CalibrationTarget, samples_collected: usize, samples_needed: usize) -> Self {
        Self {
            target,
            samples_collected,
            samples_needed,
        }
    }

    /// Monotonic step counter reported to the display
    pub fn step(&self) -> usize {
        self.samples_collected
    }

    pub fn is_complete(&self) -> bool {
        self.samples_collected >= self.samples_needed
    }

    /// Get progress percentage (0-100)
    pub fn percentage(&self) -> u8 {
        if self.samples_needed == 0 {
            return 0;
        }
        ((self.samples_collected as f32 / self.samples_needed as f32) * 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_sampling_mode() {
        assert!(CalibrationTarget::DarkOffset.uses_raw_samples());
        assert!(CalibrationTarget::WhiteReference.uses_raw_samples());
        assert!(!CalibrationTarget::Color(3).uses_raw_samples());

        assert!(CalibrationTarget::DarkOffset.needs_dark());
        assert!(!CalibrationTarget::WhiteReference.needs_dark());
    }

    #[test]
    fn test_target_display_name() {
        assert_eq!(CalibrationTarget::DarkOffset.display_name(), "DARK");
        assert_eq!(CalibrationTarget::Color(4).display_name(), "COLOR 4");
    }

    #[test]
    fn test_progress_percentage() {
        let progress = CalibrationProgress::new(CalibrationTarget::WhiteReference, 5, 20);
        assert_eq!(progress.percentage(), 25);
        assert_eq!(progress.step(), 5);
        assert!(!progress.is_complete());

        let progress = CalibrationProgress::new(CalibrationTarget::WhiteReference, 20, 20);
        assert_eq!(progress.percentage(), 100);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_progress_percentage_zero_needed() {
        let progress = CalibrationProgress::new(CalibrationTarget::DarkOffset, 0, 0);
        assert_eq!(progress.percentage(), 0);
    }

    #[test]
    fn test_target_serializes_with_slot() {
        let json = serde_json::to_string(&CalibrationTarget::Color(2)).unwrap();
        assert_eq!(json, r#"{"kind":"color","slot":2}"#);

        let parsed: CalibrationTarget = serde_json::from_str(r#"{"kind":"dark_offset"}"#).unwrap();
        assert_eq!(parsed, CalibrationTarget::DarkOffset);
    }
}
