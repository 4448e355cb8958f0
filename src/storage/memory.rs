// MemoryStorage - in-process ProfileStorage for tests and simulation
//
// Clones share one document, so a test can keep a handle and inspect what the
// instrument wrote.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{ProfileStorage, StoredDocument};
use crate::calibration::CalibrationProfile;
use crate::config::InstrumentSettings;
use crate::error::StorageError;

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    document: Arc<Mutex<StoredDocument>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryStorage {
    /// Empty storage without a validity marker
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-loaded with a document
    pub fn with_document(document: StoredDocument) -> Self {
        Self {
            document: Arc::new(Mutex::new(document)),
            fail_writes: Arc::new(Mutex::new(false)),
        }
    }

    /// Copy of the current document
    pub fn snapshot(&self) -> StoredDocument {
        self.document().clone()
    }

    /// Overwrite the validity marker
    pub fn set_marker(&self, marker: Option<u8>) {
        self.document().marker = marker;
    }

    /// Make every subsequent write fail with an I/O error
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }

    fn document(&self) -> MutexGuard<'_, StoredDocument> {
        self.document.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if *self.fail_writes.lock().unwrap_or_else(|e| e.into_inner()) {
            Err(StorageError::Io {
                details: "write rejected".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl ProfileStorage for MemoryStorage {
    fn is_valid(&self) -> bool {
        self.document().is_valid()
    }

    fn load_profile(&self, channel: usize) -> Result<CalibrationProfile, StorageError> {
        self.document().profile(channel)
    }

    fn save_profile(
        &mut self,
        channel: usize,
        profile: &CalibrationProfile,
    ) -> Result<(), StorageError> {
        self.check_writable()?;
        self.document().put_profile(channel, profile);
        Ok(())
    }

    fn load_settings(&self) -> Result<InstrumentSettings, StorageError> {
        self.document().settings()
    }

    fn save_settings(&mut self, settings: &InstrumentSettings) -> Result<(), StorageError> {
        self.check_writable()?;
        self.document().put_settings(settings);
        Ok(())
    }
}
