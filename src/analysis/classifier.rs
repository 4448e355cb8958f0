// Classifier - nearest-centroid color classification
//
// A calibrated sample is assigned to the centroid with the smallest squared
// Euclidean distance. The scan runs left to right with a strict `<`, so ties
// go to the lowest slot index. An empty table yields no classification rather
// than an index.
//
// Callers only need the arg-min; no confidence score is produced.

use crate::calibration::{CalibrationProfile, ColorCentroid};
use crate::color::{CalibratedSample, SlotIndex};

/// Arg-min over a centroid table
///
/// # Returns
/// * `Some(slot)` - Index of the nearest centroid, always `< centroids.len()`
/// * `None` - The table is empty
pub fn nearest_centroid(sample: &CalibratedSample, centroids: &[ColorCentroid]) -> Option<SlotIndex> {
    let mut best: Option<(SlotIndex, f32)> = None;

    for (slot, centroid) in centroids.iter().enumerate() {
        let distance = sample.distance_squared(&centroid.reference);
        match best {
            Some((_, best_distance)) if distance < best_distance => best = Some((slot, distance)),
            None => best = Some((slot, distance)),
            Some(_) => {}
        }
    }

    best.map(|(slot, _)| slot)
}

/// Classify a calibrated sample against a channel's profile
pub fn classify(sample: &CalibratedSample, profile: &CalibrationProfile) -> Option<SlotIndex> {
    nearest_centroid(sample, &profile.centroids)
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
