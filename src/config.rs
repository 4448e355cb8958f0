//! Configuration management for instrument tuning
//!
//! This module provides runtime configuration loading from JSON files so
//! scheduler timing, calibration sampling and the default channel settings
//! can be adjusted without recompilation. It also defines the menu settings
//! that are persisted next to the calibration profiles.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ErrorCode, InstrumentError};
use crate::scale::ScaleKind;

/// Maximum number of sensing channels on the shared bus
pub const MAX_CHANNELS: usize = 4;

/// Highest octave setting; octave 4 leaves mapped notes untransposed
pub const MAX_OCTAVE: u8 = 9;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub instrument: InstrumentConfig,
}

/// Channel scheduler timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of sensing channels polled round-robin (1-4)
    pub channel_count: usize,
    /// Wait after switching the bus before the sensor is read
    pub settle_ms: u64,
    /// Minimum time between the starts of two polling rounds
    pub round_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            channel_count: MAX_CHANNELS,
            settle_ms: 1,
            round_interval_ms: 50,
        }
    }
}

/// Calibration workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Sampling iterations per calibration run
    pub samples_per_step: usize,
    /// Clear-channel count that normalized samples are scaled to
    pub clear_full_scale: f32,
    /// Normalize flag for freshly created default profiles
    pub normalize: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples_per_step: 20,
            clear_full_scale: 65535.0,
            normalize: true,
        }
    }
}

/// Per-channel voice settings edited from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Assigned MIDI output channel (1-16)
    pub midi_channel: u8,
    /// Octave setting (0-9, 4 = no transposition)
    pub octave: u8,
    /// Note-on velocity (0-127)
    pub velocity: u8,
}

impl ChannelSettings {
    pub fn new(midi_channel: u8, octave: u8, velocity: u8) -> Self {
        Self {
            midi_channel,
            octave,
            velocity,
        }
    }

    /// Factory settings for a sensing channel (A=0 .. D=3)
    pub fn default_for_channel(channel: usize) -> Self {
        match channel {
            0 => Self::new(3, 1, 127),
            1 => Self::new(2, 3, 127),
            2 => Self::new(7, 4, 127),
            _ => Self::new(12, 6, 127),
        }
    }

    /// Check every field against its range
    pub fn validate(&self) -> Result<(), InstrumentError> {
        check_midi_channel(self.midi_channel)?;
        check_octave(self.octave)?;
        check_velocity(self.velocity)
    }
}

pub(crate) fn check_midi_channel(value: u8) -> Result<(), InstrumentError> {
    if (1..=16).contains(&value) {
        Ok(())
    } else {
        Err(InstrumentError::InvalidSetting {
            setting: "midi_channel",
            value: value as i32,
        })
    }
}

pub(crate) fn check_octave(value: u8) -> Result<(), InstrumentError> {
    if value <= MAX_OCTAVE {
        Ok(())
    } else {
        Err(InstrumentError::InvalidSetting {
            setting: "octave",
            value: value as i32,
        })
    }
}

pub(crate) fn check_velocity(value: u8) -> Result<(), InstrumentError> {
    check_midi_value("velocity", value)
}

pub(crate) fn check_midi_value(setting: &'static str, value: u8) -> Result<(), InstrumentError> {
    if value <= 127 {
        Ok(())
    } else {
        Err(InstrumentError::InvalidSetting {
            setting,
            value: value as i32,
        })
    }
}

/// Instrument defaults: root note, scale and channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// MIDI note of scale degree 0 (C4 = 60)
    pub root_note: u8,
    pub scale: ScaleKind,
    /// Capacity of the input event ring buffer
    pub input_queue_capacity: usize,
    /// Default settings per sensing channel, used when storage is invalid
    pub channels: Vec<ChannelSettings>,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            root_note: 60,
            scale: ScaleKind::Major,
            input_queue_capacity: 32,
            channels: (0..MAX_CHANNELS)
                .map(ChannelSettings::default_for_channel)
                .collect(),
        }
    }
}

/// Menu settings persisted alongside the calibration profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSettings {
    pub channels: Vec<ChannelSettings>,
    pub root_note: u8,
    pub scale: ScaleKind,
}

impl InstrumentSettings {
    /// Settings for `channel_count` channels taken from the configuration
    ///
    /// Channels missing from the config fall back to factory settings.
    pub fn from_config(config: &InstrumentConfig, channel_count: usize) -> Self {
        let channels = (0..channel_count)
            .map(|i| {
                config
                    .channels
                    .get(i)
                    .copied()
                    .unwrap_or_else(|| ChannelSettings::default_for_channel(i))
            })
            .collect();

        Self {
            channels,
            root_note: config.root_note,
            scale: config.scale,
        }
    }

    pub fn validate(&self) -> Result<(), InstrumentError> {
        check_midi_value("root_note", self.root_note)?;
        self.channels.iter().try_for_each(ChannelSettings::validate)
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration; if the file doesn't exist, the JSON is invalid or
    /// a value is out of range, the default config is returned instead.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                Ok(config) => match config.validate() {
                    Ok(()) => {
                        log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                        config
                    }
                    Err(err) => {
                        log::warn!(
                            "[Config] Rejected configuration from {:?}: {}. Using defaults.",
                            path.as_ref(),
                            err.message()
                        );
                        Self::default()
                    }
                },
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Check ranges the type system cannot express
    pub fn validate(&self) -> Result<(), InstrumentError> {
        let invalid = |reason: String| Err(InstrumentError::InvalidConfiguration { reason });

        if !(1..=MAX_CHANNELS).contains(&self.scheduler.channel_count) {
            return invalid(format!(
                "scheduler.channel_count must be 1-{}, got {}",
                MAX_CHANNELS, self.scheduler.channel_count
            ));
        }
        if self.calibration.samples_per_step == 0 {
            return invalid("calibration.samples_per_step must be positive".to_string());
        }
        if self.calibration.clear_full_scale.is_nan() || self.calibration.clear_full_scale <= 0.0 {
            return invalid(format!(
                "calibration.clear_full_scale must be positive, got {}",
                self.calibration.clear_full_scale
            ));
        }
        if self.instrument.input_queue_capacity == 0 {
            return invalid("instrument.input_queue_capacity must be positive".to_string());
        }
        if self.instrument.root_note > 127 {
            return invalid(format!(
                "instrument.root_note must be 0-127, got {}",
                self.instrument.root_note
            ));
        }
        for (i, channel) in self.instrument.channels.iter().enumerate() {
            if let Err(err) = channel.validate() {
                return invalid(format!("instrument.channels[{}]: {}", i, err.message()));
            }
        }
        Ok(())
    }
}
