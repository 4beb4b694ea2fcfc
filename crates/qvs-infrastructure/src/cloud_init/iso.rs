//! NoCloud seed ISO assembly.
//!
//! cloud-init's NoCloud datasource reads `user-data` and `meta-data` from a
//! volume labelled `cidata`. The image is mastered by an external tool:
//! `genisoimage` on Linux, `mkisofs` (cdrtools) on macOS.

use qvs_core::{QvsError, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

#[cfg(target_os = "macos")]
const DEFAULT_TOOL: &str = "mkisofs";
#[cfg(target_os = "macos")]
const INSTALL_HINT: &str = " Install it with 'brew install cdrtools'";

#[cfg(not(target_os = "macos"))]
const DEFAULT_TOOL: &str = "genisoimage";
#[cfg(not(target_os = "macos"))]
const INSTALL_HINT: &str = "";

/// The two documents that make up a seed image.
#[derive(Debug, Clone)]
pub struct CloudInitSeed {
    pub meta_data: String,
    pub user_data: String,
}

impl CloudInitSeed {
    pub fn new(meta_data: impl Into<String>, user_data: impl Into<String>) -> Self {
        Self {
            meta_data: meta_data.into(),
            user_data: user_data.into(),
        }
    }
}

/// Runs the ISO mastering tool.
#[derive(Debug, Clone)]
pub struct IsoBuilder {
    tool: String,
}

impl Default for IsoBuilder {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
        }
    }
}

impl IsoBuilder {
    pub fn with_tool(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    /// Writes `seed` to `output` as a `cidata` ISO.
    ///
    /// The documents are staged in a temporary directory under their
    /// canonical names first, because the tool uses the file names as they
    /// appear on disk.
    pub fn build(&self, seed: &CloudInitSeed, output: &Path) -> Result<()> {
        let staging = tempfile::Builder::new().prefix("ci-tmp-data").tempdir()?;
        let user_data = staging.path().join("user-data");
        let meta_data = staging.path().join("meta-data");
        fs::write(&user_data, &seed.user_data)?;
        fs::write(&meta_data, &seed.meta_data)?;

        tracing::debug!("Running {} to create {}", self.tool, output.display());
        let result = self.command(output, &user_data, &meta_data).output();

        let out = match result {
            Ok(out) => out,
            Err(e) => {
                return Err(QvsError::Command(format!(
                    "{}. Is '{}' installed?{}",
                    e, self.tool, INSTALL_HINT
                )));
            }
        };

        if !out.status.success() {
            return Err(QvsError::Command(format!(
                "{}, {}. Is '{}' installed?{}",
                String::from_utf8_lossy(&out.stderr).trim(),
                out.status,
                self.tool,
                INSTALL_HINT
            )));
        }

        Ok(())
    }

    fn command(&self, output: &Path, user_data: &Path, meta_data: &Path) -> Command {
        let mut cmd = Command::new(&self.tool);
        cmd.arg("-output")
            .arg(output)
            .args(["-volid", "cidata", "-joliet", "-rock"])
            .arg(user_data)
            .arg(meta_data);
        cmd
    }
}
