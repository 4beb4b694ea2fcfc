use serde::{Deserialize, Serialize};

/// An entry of a File Station `get_list` response (`datas` array).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub isfolder: i32,
    /// Modification time as formatted by QTS.
    #[serde(default)]
    pub mt: String,
    #[serde(default)]
    pub epochmt: i64,
}

impl RemoteFile {
    pub fn is_folder(&self) -> bool {
        self.isfolder == 1
    }

    /// Folders and `.img` files, excluding QTS housekeeping entries (`@Recycle`
    /// and friends).
    pub fn is_image_candidate(&self) -> bool {
        (self.filename.contains(".img") || self.is_folder()) && !self.filename.contains('@')
    }
}

/// Parent directory of a NAS path (`/a/b` -> `/a`, `/a` -> `/`).
///
/// NAS paths are always `/`-separated regardless of the local platform, so
/// `std::path` is not used for them.
pub fn remote_parent(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/".to_string(),
        Some(i) => trimmed[..i].to_string(),
        None if path.starts_with('/') => "/".to_string(),
        None => ".".to_string(),
    }
}

/// Last element of a NAS path.
pub fn remote_basename(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" }.to_string();
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

/// Joins NAS path segments, skipping empty ones.
pub fn remote_join(base: &str, tail: &str) -> String {
    if tail.is_empty() {
        return base.to_string();
    }
    if base.is_empty() {
        return tail.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        tail.trim_start_matches('/')
    )
}
