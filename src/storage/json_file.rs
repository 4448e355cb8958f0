// JsonFileStorage - ProfileStorage backed by one JSON document on disk
//
// The whole document is read once when opened and rewritten on every save.
// Writes go to a sibling temp file that is then renamed over the target, so a
// crash mid-write leaves the previous document intact.

use std::fs;
use std::path::{Path, PathBuf};

use super::{ProfileStorage, StoredDocument};
use crate::calibration::CalibrationProfile;
use crate::config::InstrumentSettings;
use crate::error::{log_storage_error, StorageError};

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    document: StoredDocument,
}

impl JsonFileStorage {
    /// Open a storage file
    ///
    /// A missing file starts an empty, unmarked document. An unreadable or
    /// malformed file is logged and treated the same way, so the instrument
    /// falls back to defaults instead of merging partial data.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let document = match Self::read_document(&path) {
            Ok(Some(document)) => {
                log::info!("[Storage] Loaded {:?}", path);
                document
            }
            Ok(None) => {
                log::info!("[Storage] No storage file at {:?}, starting empty", path);
                StoredDocument::default()
            }
            Err(err) => {
                log_storage_error(&err, "JsonFileStorage::open");
                StoredDocument::default()
            }
        };

        Self { path, document }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &StoredDocument {
        &self.document
    }

    fn read_document(path: &Path) -> Result<Option<StoredDocument>, StorageError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn flush(&self, document: &StoredDocument) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(document)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a change to a copy of the document and commit it only once written
    fn update(&mut self, change: impl FnOnce(&mut StoredDocument)) -> Result<(), StorageError> {
        let mut next = self.document.clone();
        change(&mut next);
        self.flush(&next)?;
        self.document = next;
        Ok(())
    }
}

impl ProfileStorage for JsonFileStorage {
    fn is_valid(&self) -> bool {
        self.document.is_valid()
    }

    fn load_profile(&self, channel: usize) -> Result<CalibrationProfile, StorageError> {
        self.document.profile(channel)
    }

    fn save_profile(
        &mut self,
        channel: usize,
        profile: &CalibrationProfile,
    ) -> Result<(), StorageError> {
        self.update(|doc| doc.put_profile(channel, profile))
    }

    fn load_settings(&self) -> Result<InstrumentSettings, StorageError> {
        self.document.settings()
    }

    fn save_settings(&mut self, settings: &InstrumentSettings) -> Result<(), StorageError> {
        self.update(|doc| doc.put_settings(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorPalette, Rgb};
    use crate::config::InstrumentConfig;
    use crate::storage::STORAGE_MAGIC;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_invalid() {
        let dir = tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path().join("storage.json"));

        assert!(!storage.is_valid());
        assert!(storage.load_profile(0).is_err());
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut profile = CalibrationProfile::default_for(&ColorPalette::standard());
        profile.set_dark_offset(Rgb::new(10.0, 11.0, 12.0));
        let settings = InstrumentSettings::from_config(&InstrumentConfig::default(), 4);

        {
            let mut storage = JsonFileStorage::open(&path);
            storage.save_profile(1, &profile).unwrap();
            storage.save_settings(&settings).unwrap();
        }

        let reopened = JsonFileStorage::open(&path);
        assert!(reopened.is_valid());
        assert_eq!(reopened.document().marker, Some(STORAGE_MAGIC));
        assert_eq!(reopened.load_profile(1), Ok(profile));
        assert_eq!(reopened.load_settings(), Ok(settings));
        assert!(!dir.path().join("storage.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = JsonFileStorage::open(&path);
        assert!(!storage.is_valid());
    }

    #[test]
    fn test_failed_write_keeps_previous_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("storage.json");
        let mut storage = JsonFileStorage::open(&path);
        let profile = CalibrationProfile::default_for(&ColorPalette::standard());

        assert!(matches!(
            storage.save_profile(0, &profile),
            Err(StorageError::Io { .. })
        ));
        assert!(!storage.is_valid());
    }
}
