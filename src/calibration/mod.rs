// Calibration module - per-channel profiles and the sampling workflow
//
// This module provides four components:
// 1. CalibrationProfile: dark offset, gains and the color centroid table
// 2. CalibrationStore: one profile per sensing channel, owned by the loop root
// 3. CalibrationProcedure: accumulate/average loop for one target
// 4. CalibrationProgress: step counter reported to the display
//
// The calibration workflow:
// 1. Create a CalibrationProcedure for a target (dark, white or a color slot)
// 2. Feed it exactly `samples_per_step` samples
// 3. Finalize and apply the averaged outcome to the channel's profile

pub mod procedure;
pub mod profile;
pub mod progress;
pub mod store;

pub use procedure::{CalibrationOutcome, CalibrationProcedure, DEFAULT_SAMPLES_PER_STEP};
pub use profile::{default_reference, CalibrationProfile, ColorCentroid};
pub use progress::{CalibrationProgress, CalibrationTarget};
pub use store::CalibrationStore;
