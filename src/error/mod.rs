// Error types for the color-to-MIDI instrument
//
// This module defines custom error types for calibration, storage and
// instrument configuration, providing structured error handling with numeric
// codes that the display collaborator can show without string parsing.

mod calibration;
mod instrument;
mod storage;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use instrument::{log_instrument_error, InstrumentError, InstrumentErrorCodes};
pub use storage::{log_storage_error, StorageError, StorageErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the collaborator boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
