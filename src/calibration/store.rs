// CalibrationStore - one CalibrationProfile per sensing channel
//
// Owned by the control loop root and lent to the scheduler (read) and the
// calibration workflow (write). Profiles never alias; the only cross-channel
// operation is copy_profile.

use crate::calibration::profile::CalibrationProfile;
use crate::color::ColorPalette;
use crate::error::{log_storage_error, CalibrationError, StorageError};
use crate::storage::ProfileStorage;

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationStore {
    profiles: Vec<CalibrationProfile>,
}

impl CalibrationStore {
    /// Default profile on every channel
    pub fn with_defaults(channel_count: usize, palette: &ColorPalette) -> Self {
        Self::from_profiles(vec![CalibrationProfile::default_for(palette); channel_count])
    }

    pub fn from_profiles(profiles: Vec<CalibrationProfile>) -> Self {
        Self { profiles }
    }

    /// Load every channel's profile from storage
    ///
    /// Stored data is trusted only when the validity marker is set. A channel
    /// whose read fails, or whose stored table does not fit the palette, gets
    /// the default profile wholesale; stored fields are never merged with
    /// defaults.
    pub fn load(storage: &dyn ProfileStorage, channel_count: usize, palette: &ColorPalette) -> Self {
        if !storage.is_valid() {
            log::warn!("[Storage] Validity marker not set, using default calibration");
            return Self::with_defaults(channel_count, palette);
        }

        let profiles = (0..channel_count)
            .map(|channel| match storage.load_profile(channel) {
                Ok(profile) if profile.matches_palette(palette) => profile,
                Ok(profile) => {
                    let err = StorageError::Serialization {
                        details: format!(
                            "stored profile has {} centroids for a {}-slot palette",
                            profile.slot_count(),
                            palette.len()
                        ),
                    };
                    log_storage_error(&err, &format!("CalibrationStore::load channel {}", channel));
                    CalibrationProfile::default_for(palette)
                }
                Err(err) => {
                    log_storage_error(&err, &format!("CalibrationStore::load channel {}", channel));
                    CalibrationProfile::default_for(palette)
                }
            })
            .collect();

        Self { profiles }
    }

    pub fn channel_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn profile(&self, channel: usize) -> Option<&CalibrationProfile> {
        self.profiles.get(channel)
    }

    pub fn profile_mut(&mut self, channel: usize) -> Option<&mut CalibrationProfile> {
        self.profiles.get_mut(channel)
    }

    pub fn profiles_mut(&mut self) -> &mut [CalibrationProfile] {
        &mut self.profiles
    }

    pub fn profiles(&self) -> &[CalibrationProfile] {
        &self.profiles
    }

    /// Copy one channel's calibration verbatim onto other channels
    ///
    /// Dark offset, gain, normalize flag and the centroid table are copied.
    /// Runtime state and the active scale live elsewhere and are untouched.
    /// The source itself is skipped if listed as a target.
    pub fn copy_profile(&mut self, source: usize, targets: &[usize]) -> Result<(), CalibrationError> {
        let channel_count = self.profiles.len();
        let invalid = |channel| CalibrationError::InvalidChannel {
            channel,
            channel_count,
        };

        let source_profile = self.profiles.get(source).cloned().ok_or(invalid(source))?;
        if let Some(&bad) = targets.iter().find(|&&t| t >= channel_count) {
            return Err(invalid(bad));
        }

        for &target in targets.iter().filter(|&&t| t != source) {
            self.profiles[target].copy_calibration_from(&source_profile);
        }

        log::info!(
            "[Calibration] Copied profile from channel {} to {:?}",
            source,
            targets
        );
        Ok(())
    }

    /// Write one channel's profile back to storage
    pub fn persist(&self, channel: usize, storage: &mut dyn ProfileStorage) -> Result<(), StorageError> {
        let profile = self
            .profiles
            .get(channel)
            .ok_or(StorageError::InvalidChannel { channel })?;
        storage.save_profile(channel, profile)
    }
}
