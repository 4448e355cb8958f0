// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Single source of truth for the numeric codes reported to the display.
///
/// Error code range: 2001-2007
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// Insufficient samples collected for calibration
    pub const INSUFFICIENT_SAMPLES: i32 = 2001;

    /// Target color slot outside the centroid table
    pub const INVALID_SLOT: i32 = 2002;

    /// Calibration not complete
    pub const NOT_COMPLETE: i32 = 2003;

    /// Calibration already in progress
    pub const ALREADY_IN_PROGRESS: i32 = 2004;

    /// More samples offered than the procedure accepts
    pub const ALREADY_COMPLETE: i32 = 2005;

    /// Calibration requested for a channel that does not exist
    pub const INVALID_CHANNEL: i32 = 2006;

    /// Sensor reported unavailable for the whole run
    pub const SENSOR_UNAVAILABLE: i32 = 2007;
}

/// Log a calibration error with structured context
///
/// This function logs calibration errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=CalibrationWorkflow, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// These errors cover the sample-accumulate-average workflow and the
/// write-back of its result into a calibration profile.
///
/// Error code ranges: 2001-2007
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Insufficient samples collected for calibration
    InsufficientSamples { required: usize, collected: usize },

    /// Target color slot outside the centroid table
    InvalidSlot { slot: usize, slot_count: usize },

    /// Calibration not complete
    NotComplete,

    /// Calibration already in progress
    AlreadyInProgress,

    /// More samples offered than the procedure accepts
    AlreadyComplete { samples_needed: usize },

    /// Calibration requested for a channel that does not exist
    InvalidChannel { channel: usize, channel_count: usize },

    /// Sensor reported unavailable for the whole run
    SensorUnavailable { channel: usize },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::InsufficientSamples { .. } => {
                CalibrationErrorCodes::INSUFFICIENT_SAMPLES
            }
            CalibrationError::InvalidSlot { .. } => CalibrationErrorCodes::INVALID_SLOT,
            CalibrationError::NotComplete => CalibrationErrorCodes::NOT_COMPLETE,
            CalibrationError::AlreadyInProgress => CalibrationErrorCodes::ALREADY_IN_PROGRESS,
            CalibrationError::AlreadyComplete { .. } => CalibrationErrorCodes::ALREADY_COMPLETE,
            CalibrationError::InvalidChannel { .. } => CalibrationErrorCodes::INVALID_CHANNEL,
            CalibrationError::SensorUnavailable { .. } => {
                CalibrationErrorCodes::SENSOR_UNAVAILABLE
            }
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::InsufficientSamples {
                required,
                collected,
            } => {
                format!("Insufficient samples: need {}, got {}", required, collected)
            }
            CalibrationError::InvalidSlot { slot, slot_count } => {
                format!("Color slot {} out of range (table has {})", slot, slot_count)
            }
            CalibrationError::NotComplete => "Calibration not complete".to_string(),
            CalibrationError::AlreadyInProgress => "Calibration already in progress".to_string(),
            CalibrationError::AlreadyComplete { samples_needed } => {
                format!("Calibration already collected {} samples", samples_needed)
            }
            CalibrationError::InvalidChannel {
                channel,
                channel_count,
            } => {
                format!(
                    "Channel {} out of range ({} channels configured)",
                    channel, channel_count
                )
            }
            CalibrationError::SensorUnavailable { channel } => {
                format!("Sensor on channel {} unavailable", channel)
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_error_codes() {
        assert_eq!(
            CalibrationError::InsufficientSamples {
                required: 20,
                collected: 3
            }
            .code(),
            CalibrationErrorCodes::INSUFFICIENT_SAMPLES
        );
        assert_eq!(
            CalibrationError::InvalidSlot {
                slot: 12,
                slot_count: 10
            }
            .code(),
            CalibrationErrorCodes::INVALID_SLOT
        );
        assert_eq!(
            CalibrationError::NotComplete.code(),
            CalibrationErrorCodes::NOT_COMPLETE
        );
        assert_eq!(
            CalibrationError::AlreadyInProgress.code(),
            CalibrationErrorCodes::ALREADY_IN_PROGRESS
        );
        assert_eq!(
            CalibrationError::AlreadyComplete { samples_needed: 20 }.code(),
            CalibrationErrorCodes::ALREADY_COMPLETE
        );
        assert_eq!(
            CalibrationError::InvalidChannel {
                channel: 5,
                channel_count: 4
            }
            .code(),
            CalibrationErrorCodes::INVALID_CHANNEL
        );
        assert_eq!(
            CalibrationError::SensorUnavailable { channel: 1 }.code(),
            CalibrationErrorCodes::SENSOR_UNAVAILABLE
        );
    }

    #[test]
    fn test_calibration_error_messages() {
        let err = CalibrationError::InsufficientSamples {
            required: 20,
            collected: 3,
        };
        assert_eq!(err.message(), "Insufficient samples: need 20, got 3");

        let err = CalibrationError::InvalidSlot {
            slot: 12,
            slot_count: 10,
        };
        assert_eq!(err.message(), "Color slot 12 out of range (table has 10)");

        let err = CalibrationError::AlreadyInProgress;
        assert!(err.message().contains("already in progress"));

        let err = CalibrationError::SensorUnavailable { channel: 2 };
        assert!(err.message().contains("channel 2"));
    }

    #[test]
    fn test_calibration_error_display() {
        let err = CalibrationError::NotComplete;
        let display = format!("{}", err);
        assert!(display.contains("CalibrationError"));
        assert!(display.contains(&err.code().to_string()));
    }
}
