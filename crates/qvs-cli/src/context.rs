//! Per-invocation context: resolved configuration and session access.

use anyhow::{Context, Result};
use qvs_core::config::{ClientConfig, ConfigDefaults};
use qvs_infrastructure::storage::ConfigStorage;
use qvs_infrastructure::{FileCredentialStore, QvsPaths};
use qvs_interaction::SessionManager;

use crate::GlobalArgs;

pub struct AppContext {
    pub config: ClientConfig,
}

impl AppContext {
    /// Layers flags and environment over `config.toml` over built-in defaults.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let file_defaults = match QvsPaths::config_file() {
            Ok(path) => ConfigStorage::new(path.clone())
                .load()
                .with_context(|| format!("Failed to read config file {}", path.display()))?
                .map(|root| root.defaults)
                .unwrap_or_default(),
            Err(e) => {
                tracing::debug!("No config directory: {}", e);
                ConfigDefaults::default()
            }
        };

        let default_login_file =
            QvsPaths::default_login_file().context("Failed to resolve default login file")?;

        let overrides = ConfigDefaults {
            qts_url: args.qts_url.clone(),
            login_file: args.login_file.clone(),
            disks_dir: args.disks_dir.clone(),
            images_dir: args.images_dir.clone(),
        };

        let config = ClientConfig::layered(overrides, file_defaults, default_login_file);
        tracing::debug!("Using QTS at {}", config.qts_url);
        Ok(Self { config })
    }

    /// Opens the session without validating it.
    pub fn open_session(&self) -> Result<SessionManager> {
        let store = FileCredentialStore::new(self.config.login_file.clone());
        Ok(SessionManager::open(&self.config.qts_url, Box::new(store))?)
    }

    /// Opens the session and checks it is still accepted by QTS.
    pub async fn connect(&self) -> Result<SessionManager> {
        let mut session = self.open_session()?;
        session.ensure_logged_in().await?;
        Ok(session)
    }

    pub fn snapshot_dir(&self) -> String {
        qvs_core::remote_file::remote_join(&self.config.images_dir, "snapshots")
    }
}
