//! File-backed credential store.

use crate::storage::{AtomicJsonError, AtomicJsonFile};
use qvs_core::credential::CredentialStore;
use qvs_core::session::SessionRecord;
use qvs_core::{QvsError, Result};
use std::path::PathBuf;

/// Stores the session record as pretty-printed JSON at a fixed path
/// (`~/.qvs_login` unless overridden).
pub struct FileCredentialStore {
    file: AtomicJsonFile<SessionRecord>,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    fn display_path(&self) -> String {
        self.file.path().display().to_string()
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<SessionRecord> {
        match self.file.load() {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(QvsError::not_found("login file", self.display_path())),
            Err(AtomicJsonError::JsonError(e)) => {
                Err(QvsError::corrupt_record(self.display_path(), e.to_string()))
            }
            Err(AtomicJsonError::IoError(e)) => Err(e.into()),
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        self.file
            .save(record)
            .map_err(|e| QvsError::persist_failed(self.display_path(), e.to_string()))?;
        tracing::debug!("Saved session record to {}", self.display_path());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.file.remove().map_err(|e| QvsError::io(e.to_string()))
    }

    fn location(&self) -> String {
        self.display_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qvs_core::session::{LegacySession, ModernSession};
    use std::fs;
    use tempfile::TempDir;

    fn complete_record() -> SessionRecord {
        SessionRecord::legacy_only("https://nas", LegacySession::new("bob", "ABC"))
            .with_modern(ModernSession::new("tok123", "sess456"))
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp_dir.path().join(".qvs_login"));

        let record = complete_record();
        store.save(&record).unwrap();

        assert_eq!(store.load().unwrap(), record);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp_dir.path().join(".qvs_login"));

        assert!(store.load().unwrap_err().is_not_found());
    }

    #[test]
    fn test_empty_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".qvs_login");
        fs::write(&path, "").unwrap();

        let store = FileCredentialStore::new(path);
        assert!(store.load().unwrap_err().is_not_found());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".qvs_login");
        fs::write(&path, "{ not json").unwrap();

        let store = FileCredentialStore::new(path);
        assert!(matches!(
            store.load(),
            Err(QvsError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_legacy_file_without_modern_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".qvs_login");
        fs::write(&path, r#"{"username": "bob", "qts_sessionid": "ABC"}"#).unwrap();

        let record = FileCredentialStore::new(path).load().unwrap();
        assert_eq!(record.legacy, LegacySession::new("bob", "ABC"));
        assert_eq!(record.modern, ModernSession::default());
    }

    #[test]
    fn test_save_is_idempotent_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp_dir.path().join(".qvs_login"));

        store.save(&complete_record()).unwrap();
        let legacy = SessionRecord::legacy_only("https://nas", LegacySession::new("amy", "XYZ"));
        store.save(&legacy).unwrap();
        store.save(&legacy).unwrap();

        assert_eq!(store.load().unwrap(), legacy);
    }

    #[test]
    fn test_save_into_missing_directory_is_persist_failed() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "file, not a dir").unwrap();

        let store = FileCredentialStore::new(blocker.join(".qvs_login"));
        assert!(matches!(
            store.save(&complete_record()),
            Err(QvsError::PersistFailed { .. })
        ));
    }

    #[test]
    fn test_clear_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp_dir.path().join(".qvs_login"));
        store.save(&complete_record()).unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap_err().is_not_found());
        store.clear().unwrap();
    }
}
