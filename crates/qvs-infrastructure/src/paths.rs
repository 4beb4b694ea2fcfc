//! Path resolution for qvscli files.
//!
//! ```text
//! ~/.qvs_login                 # Session record (default login file)
//! ~/.config/qvs/               # Config directory
//! └── config.toml              # Optional default flag values
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct QvsPaths;

impl QvsPaths {
    const APP_DIR: &'static str = "qvs";
    const LOGIN_FILE: &'static str = ".qvs_login";

    /// Returns the qvscli configuration directory (e.g. `~/.config/qvs/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default session record location, `~/.qvs_login`.
    ///
    /// # Security Note
    ///
    /// The file holds live session ids; it is written with mode 600.
    pub fn default_login_file() -> Result<PathBuf, PathError> {
        dirs::home_dir()
            .map(|home| home.join(Self::LOGIN_FILE))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the default SSH public key used for cloud-init user-data.
    pub fn default_authorized_key() -> Result<PathBuf, PathError> {
        dirs::home_dir()
            .map(|home| home.join(".ssh").join("id_rsa.pub"))
            .ok_or(PathError::HomeDirNotFound)
    }
}
