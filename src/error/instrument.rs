// Instrument configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Instrument error code constants
///
/// Error code range: 4001-4006
pub struct InstrumentErrorCodes {}

impl InstrumentErrorCodes {
    /// Sensing channel index outside the configured range
    pub const INVALID_CHANNEL: i32 = 4001;

    /// Palette, centroid table and scale disagree on slot count
    pub const TABLE_MISMATCH: i32 = 4002;

    /// Scale definition rejected
    pub const INVALID_SCALE: i32 = 4003;

    /// Color palette rejected
    pub const INVALID_PALETTE: i32 = 4004;

    /// Channel setting out of range (MIDI channel, octave, velocity, root)
    pub const INVALID_SETTING: i32 = 4005;

    /// Configuration file values out of range
    pub const INVALID_CONFIGURATION: i32 = 4006;
}

/// Log an instrument error with structured context
pub fn log_instrument_error(err: &InstrumentError, context: &str) {
    error!(
        "Instrument error in {}: code={}, component=Instrument, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Instrument setup and settings errors
///
/// Error code ranges: 4001-4006
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentError {
    /// Sensing channel index outside the configured range
    InvalidChannel { channel: usize, channel_count: usize },

    /// Palette, centroid table and scale disagree on slot count
    TableMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Scale definition rejected
    InvalidScale { reason: String },

    /// Color palette rejected
    InvalidPalette { reason: String },

    /// Channel setting out of range
    InvalidSetting { setting: &'static str, value: i32 },

    /// Configuration file values out of range
    InvalidConfiguration { reason: String },
}

impl ErrorCode for InstrumentError {
    fn code(&self) -> i32 {
        match self {
            InstrumentError::InvalidChannel { .. } => InstrumentErrorCodes::INVALID_CHANNEL,
            InstrumentError::TableMismatch { .. } => InstrumentErrorCodes::TABLE_MISMATCH,
            InstrumentError::InvalidScale { .. } => InstrumentErrorCodes::INVALID_SCALE,
            InstrumentError::InvalidPalette { .. } => InstrumentErrorCodes::INVALID_PALETTE,
            InstrumentError::InvalidSetting { .. } => InstrumentErrorCodes::INVALID_SETTING,
            InstrumentError::InvalidConfiguration { .. } => {
                InstrumentErrorCodes::INVALID_CONFIGURATION
            }
        }
    }

    fn message(&self) -> String {
        match self {
            InstrumentError::InvalidChannel {
                channel,
                channel_count,
            } => format!(
                "Channel {} out of range ({} channels configured)",
                channel, channel_count
            ),
            InstrumentError::TableMismatch {
                table,
                expected,
                actual,
            } => format!(
                "{} has {} slots, palette has {}",
                table, actual, expected
            ),
            InstrumentError::InvalidScale { reason } => format!("Invalid scale: {}", reason),
            InstrumentError::InvalidPalette { reason } => format!("Invalid palette: {}", reason),
            InstrumentError::InvalidSetting { setting, value } => {
                format!("Setting {} out of range (got {})", setting, value)
            }
            InstrumentError::InvalidConfiguration { reason } => {
                format!("Invalid configuration: {}", reason)
            }
        }
    }
}

impl fmt::Display for InstrumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InstrumentError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for InstrumentError {}
