//! Config file storage.
//!
//! Reads the optional `config.toml` that supplies default flag values.

use qvs_core::config::ConfigRoot;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during config storage operations.
#[derive(Debug)]
pub enum ConfigStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
}

impl std::fmt::Display for ConfigStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigStorageError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigStorageError {}

impl From<std::io::Error> for ConfigStorageError {
    fn from(e: std::io::Error) -> Self {
        ConfigStorageError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigStorageError {
    fn from(e: toml::de::Error) -> Self {
        ConfigStorageError::TomlParseError(e)
    }
}

/// Read-only access to `config.toml`.
///
/// Responsibilities:
/// - Read the file if present
/// - Parse TOML into [`ConfigRoot`]
///
/// Does NOT:
/// - Apply environment variables or flags (done by the CLI)
/// - Write the file; users edit it by hand
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ConfigRoot))`: Successfully loaded
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<ConfigRoot>, ConfigStorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let root: ConfigRoot = toml::from_str(&content)?;
        Ok(Some(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().join("config.toml"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_load_defaults_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[defaults]\nqts_url = \"https://nas.example\"\ndisks_dir = \"/VM/disks\"\n",
        )
        .unwrap();

        let root = ConfigStorage::new(path).load().unwrap().unwrap();
        assert_eq!(root.defaults.qts_url.as_deref(), Some("https://nas.example"));
        assert_eq!(root.defaults.disks_dir.as_deref(), Some("/VM/disks"));
    }

    #[test]
    fn test_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[defaults\nqts_url = ").unwrap();

        let result = ConfigStorage::new(path).load();
        assert!(matches!(result, Err(ConfigStorageError::TomlParseError(_))));
    }
}
