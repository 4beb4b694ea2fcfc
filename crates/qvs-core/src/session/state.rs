use serde::{Deserialize, Serialize};

/// Lifecycle of the in-process session.
///
/// `Loaded` and `Empty` are both "not yet validated"; only `Active` may issue
/// domain requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No credential file could be read; the cookie jar is empty.
    Empty,
    /// A credential file was read and the cookie jar was seeded from it.
    Loaded,
    /// The session was validated or freshly established by a login.
    Active,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Which API generation a login has to prepare for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiGeneration {
    /// QTS only: file manager and network manager.
    Legacy,
    /// QTS plus the CSRF-protected QVS JSON API.
    #[default]
    Modern,
}

/// Endpoint family a request targets. Selects headers and status checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFamily {
    /// `/qvs/...` JSON API with envelope status.
    Qvs,
    /// `/cgi-bin/filemanager/utilRequest.cgi`
    FileManager,
    /// Network manager listing.
    NetManager,
}

impl EndpointFamily {
    /// Families authenticated by the QVS CSRF token rather than the QTS sid.
    pub fn is_modern(self) -> bool {
        matches!(self, Self::Qvs)
    }
}
