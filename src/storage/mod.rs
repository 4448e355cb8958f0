// Storage module - non-volatile profile and settings persistence
//
// The instrument only depends on the ProfileStorage port. A single validity
// marker gates whether anything stored is trusted; writing any entry stamps
// the marker. Byte layout is an adapter detail: MemoryStorage keeps the
// document in memory, JsonFileStorage writes it as one JSON file.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationProfile;
use crate::config::InstrumentSettings;
use crate::error::StorageError;

/// Marker value identifying trusted stored data
pub const STORAGE_MAGIC: u8 = 0x12;

/// Key-addressed persistence for calibration profiles and menu settings
pub trait ProfileStorage: Send {
    /// Whether the validity marker is present and correct
    fn is_valid(&self) -> bool;

    fn load_profile(&self, channel: usize) -> Result<CalibrationProfile, StorageError>;

    fn save_profile(
        &mut self,
        channel: usize,
        profile: &CalibrationProfile,
    ) -> Result<(), StorageError>;

    fn load_settings(&self) -> Result<InstrumentSettings, StorageError>;

    fn save_settings(&mut self, settings: &InstrumentSettings) -> Result<(), StorageError>;
}

/// Logical contents shared by the storage adapters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    #[serde(default)]
    pub marker: Option<u8>,
    #[serde(default)]
    pub profiles: BTreeMap<usize, CalibrationProfile>,
    #[serde(default)]
    pub settings: Option<InstrumentSettings>,
}

impl StoredDocument {
    pub fn is_valid(&self) -> bool {
        self.marker == Some(STORAGE_MAGIC)
    }

    fn check_marker(&self) -> Result<(), StorageError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(StorageError::InvalidMarker { found: self.marker })
        }
    }

    pub fn profile(&self, channel: usize) -> Result<CalibrationProfile, StorageError> {
        self.check_marker()?;
        self.profiles
            .get(&channel)
            .cloned()
            .ok_or_else(|| StorageError::MissingEntry {
                key: format!("profile/{}", channel),
            })
    }

    pub fn settings(&self) -> Result<InstrumentSettings, StorageError> {
        self.check_marker()?;
        self.settings.clone().ok_or_else(|| StorageError::MissingEntry {
            key: "settings".to_string(),
        })
    }

    pub fn put_profile(&mut self, channel: usize, profile: &CalibrationProfile) {
        self.profiles.insert(channel, profile.clone());
        self.marker = Some(STORAGE_MAGIC);
    }

    pub fn put_settings(&mut self, settings: &InstrumentSettings) {
        self.settings = Some(settings.clone());
        self.marker = Some(STORAGE_MAGIC);
    }
}
