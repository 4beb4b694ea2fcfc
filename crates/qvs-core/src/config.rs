//! Client configuration model.
//!
//! Values are layered: built-in defaults, then the `[defaults]` table of
//! `config.toml`, then environment variables and flags (the latter two are
//! merged by the CLI parser before reaching [`ClientConfig::layered`]).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_QTS_URL: &str = "https://qnap.local";
pub const DEFAULT_DISKS_DIR: &str = "/VirtualMachines/disks";
pub const DEFAULT_IMAGES_DIR: &str = "/VirtualMachines/images";

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ConfigRoot {
    #[serde(default)]
    pub defaults: ConfigDefaults,
}

/// Optional overrides. Every field may be absent.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ConfigDefaults {
    pub qts_url: Option<String>,
    pub login_file: Option<PathBuf>,
    pub disks_dir: Option<String>,
    pub images_dir: Option<String>,
}

impl ConfigDefaults {
    /// Fields set in `self` win over `lower`.
    pub fn or(self, lower: ConfigDefaults) -> ConfigDefaults {
        ConfigDefaults {
            qts_url: self.qts_url.or(lower.qts_url),
            login_file: self.login_file.or(lower.login_file),
            disks_dir: self.disks_dir.or(lower.disks_dir),
            images_dir: self.images_dir.or(lower.images_dir),
        }
    }
}

/// Fully resolved configuration used by every command.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of QTS, without a trailing slash.
    pub qts_url: String,
    pub login_file: PathBuf,
    pub disks_dir: String,
    pub images_dir: String,
}

impl ClientConfig {
    pub fn layered(
        overrides: ConfigDefaults,
        file: ConfigDefaults,
        default_login_file: PathBuf,
    ) -> Self {
        let merged = overrides.or(file);
        Self {
            qts_url: normalize_base_url(
                merged.qts_url.as_deref().unwrap_or(DEFAULT_QTS_URL),
            ),
            login_file: merged.login_file.unwrap_or(default_login_file),
            disks_dir: merged
                .disks_dir
                .unwrap_or_else(|| DEFAULT_DISKS_DIR.to_string()),
            images_dir: merged
                .images_dir
                .unwrap_or_else(|| DEFAULT_IMAGES_DIR.to_string()),
        }
    }
}

/// Trims whitespace and trailing slashes so paths can be appended directly.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let cfg = ClientConfig::layered(
            ConfigDefaults::default(),
            ConfigDefaults::default(),
            PathBuf::from("/home/bob/.qvs_login"),
        );
        assert_eq!(cfg.qts_url, DEFAULT_QTS_URL);
        assert_eq!(cfg.login_file, PathBuf::from("/home/bob/.qvs_login"));
        assert_eq!(cfg.disks_dir, DEFAULT_DISKS_DIR);
        assert_eq!(cfg.images_dir, DEFAULT_IMAGES_DIR);
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = ConfigDefaults {
            qts_url: Some("https://file-nas/".into()),
            disks_dir: Some("/file/disks".into()),
            ..Default::default()
        };
        let overrides = ConfigDefaults {
            qts_url: Some(" https://flag-nas ".into()),
            ..Default::default()
        };
        let cfg = ClientConfig::layered(overrides, file, PathBuf::from("/tmp/login"));

        assert_eq!(cfg.qts_url, "https://flag-nas");
        assert_eq!(cfg.disks_dir, "/file/disks");
    }

    #[test]
    fn test_parse_config_toml() {
        let root: ConfigRoot = toml::from_str(
            r#"
            [defaults]
            qts_url = "https://nas.example"
            images_dir = "/VM/images"
            "#,
        )
        .unwrap();
        assert_eq!(root.defaults.qts_url.as_deref(), Some("https://nas.example"));
        assert_eq!(root.defaults.images_dir.as_deref(), Some("/VM/images"));
        assert!(root.defaults.login_file.is_none());
    }
}
