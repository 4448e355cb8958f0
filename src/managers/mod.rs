// Managers Module
//
// Focused managers for workflows that span several engine parts.
//
// - CalibrationManager: pending calibration request and its execution
//   against the sensor, profile store and persistence

pub mod calibration_manager;

pub use calibration_manager::{CalibrationManager, CalibrationRequest};
