// Storage error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Storage error code constants
///
/// Error code range: 3001-3005
pub struct StorageErrorCodes {}

impl StorageErrorCodes {
    /// Validity marker missing or wrong; stored data must not be trusted
    pub const INVALID_MARKER: i32 = 3001;

    /// No entry stored for the requested key
    pub const MISSING_ENTRY: i32 = 3002;

    /// Underlying read/write failed
    pub const IO_FAILURE: i32 = 3003;

    /// Stored document could not be encoded or decoded
    pub const SERIALIZATION: i32 = 3004;

    /// Channel index outside the stored range
    pub const INVALID_CHANNEL: i32 = 3005;
}

/// Log a storage error with structured context
pub fn log_storage_error(err: &StorageError, context: &str) {
    error!(
        "Storage error in {}: code={}, component=ProfileStorage, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Non-volatile storage errors
///
/// None of these are fatal: loaders substitute defaults, writers log and
/// carry on with the in-memory state.
///
/// Error code ranges: 3001-3005
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Validity marker missing or wrong
    InvalidMarker { found: Option<u8> },

    /// No entry stored for the requested key
    MissingEntry { key: String },

    /// Underlying read/write failed
    Io { details: String },

    /// Stored document could not be encoded or decoded
    Serialization { details: String },

    /// Channel index outside the stored range
    InvalidChannel { channel: usize },
}

impl ErrorCode for StorageError {
    fn code(&self) -> i32 {
        match self {
            StorageError::InvalidMarker { .. } => StorageErrorCodes::INVALID_MARKER,
            StorageError::MissingEntry { .. } => StorageErrorCodes::MISSING_ENTRY,
            StorageError::Io { .. } => StorageErrorCodes::IO_FAILURE,
            StorageError::Serialization { .. } => StorageErrorCodes::SERIALIZATION,
            StorageError::InvalidChannel { .. } => StorageErrorCodes::INVALID_CHANNEL,
        }
    }

    fn message(&self) -> String {
        match self {
            StorageError::InvalidMarker { found: Some(value) } => {
                format!("Storage marker 0x{:02X} does not match", value)
            }
            StorageError::InvalidMarker { found: None } => "Storage marker missing".to_string(),
            StorageError::MissingEntry { key } => format!("No stored entry for {}", key),
            StorageError::Io { details } => format!("Storage I/O failed: {}", details),
            StorageError::Serialization { details } => {
                format!("Stored data could not be decoded: {}", details)
            }
            StorageError::InvalidChannel { channel } => {
                format!("No storage slot for channel {}", channel)
            }
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StorageError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for StorageError {}

/// Convert from std::io::Error to StorageError
impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            details: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization {
            details: err.to_string(),
        }
    }
}
