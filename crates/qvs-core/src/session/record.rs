//! The persisted session record.
//!
//! On disk the record is a flat JSON object (`qts_url`, `username`,
//! `qts_sessionid`, `qvs_csrftoken`, `qvs_sessionid`). In memory it is split
//! into a legacy (QTS) and a modern (QVS) half so that a request can never mix
//! a token from one generation with a session id from the other.

use serde::{Deserialize, Serialize};

/// Legacy QTS session: the user name and the `authSid` returned by
/// `authLogin.cgi`. Sent as `NAS_USER` / `NAS_SID` cookies and as the `sid`
/// parameter of the file-manager and network-manager endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySession {
    #[serde(default)]
    pub username: String,
    #[serde(default, rename = "qts_sessionid")]
    pub session_id: String,
}

impl LegacySession {
    pub fn new(username: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            session_id: session_id.into(),
        }
    }

    /// A legacy session is usable once the QTS session id is known.
    pub fn is_present(&self) -> bool {
        !self.session_id.is_empty()
    }
}

/// Modern QVS session: `csrftoken` and `sessionid` cookies issued by `/qvs/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModernSession {
    #[serde(default, rename = "qvs_csrftoken")]
    pub csrf_token: String,
    #[serde(default, rename = "qvs_sessionid")]
    pub session_id: String,
}

impl ModernSession {
    pub fn new(csrf_token: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            csrf_token: csrf_token.into(),
            session_id: session_id.into(),
        }
    }

    /// Both halves must be present; a lone token or a lone session id is
    /// never used.
    pub fn is_complete(&self) -> bool {
        !self.csrf_token.is_empty() && !self.session_id.is_empty()
    }
}

/// Everything qvscli remembers between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub qts_url: String,
    #[serde(flatten)]
    pub legacy: LegacySession,
    #[serde(flatten)]
    pub modern: ModernSession,
}

impl SessionRecord {
    /// Creates a legacy-only record right after a successful QTS login.
    pub fn legacy_only(qts_url: impl Into<String>, legacy: LegacySession) -> Self {
        Self {
            qts_url: qts_url.into(),
            legacy,
            modern: ModernSession::default(),
        }
    }

    /// Attaches the modern half obtained from the QVS bootstrap.
    pub fn with_modern(mut self, modern: ModernSession) -> Self {
        self.modern = modern;
        self
    }

    /// `true` when both the legacy and the modern halves are usable.
    pub fn is_complete(&self) -> bool {
        self.legacy.is_present() && self.modern.is_complete()
    }

    /// The modern half, only if it is fully populated.
    pub fn modern(&self) -> Option<&ModernSession> {
        self.modern.is_complete().then_some(&self.modern)
    }

    /// The legacy half, only if a session id is present.
    pub fn legacy(&self) -> Option<&LegacySession> {
        self.legacy.is_present().then_some(&self.legacy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_json_layout() {
        let record = SessionRecord::legacy_only("https://nas", LegacySession::new("bob", "ABC"))
            .with_modern(ModernSession::new("tok123", "sess456"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["qts_url"], "https://nas");
        assert_eq!(value["username"], "bob");
        assert_eq!(value["qts_sessionid"], "ABC");
        assert_eq!(value["qvs_csrftoken"], "tok123");
        assert_eq!(value["qvs_sessionid"], "sess456");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let record: SessionRecord =
            serde_json::from_str(r#"{"username": "bob", "qts_sessionid": "ABC"}"#).unwrap();

        assert_eq!(record.qts_url, "");
        assert_eq!(record.legacy, LegacySession::new("bob", "ABC"));
        assert!(record.modern().is_none());
        assert!(!record.is_complete());
    }

    #[test]
    fn test_half_populated_modern_is_not_used() {
        let record = SessionRecord::legacy_only("https://nas", LegacySession::new("bob", "ABC"))
            .with_modern(ModernSession::new("tok123", ""));

        assert!(record.modern().is_none());
        assert!(record.legacy().is_some());
    }

    #[test]
    fn test_default_record_is_empty() {
        let record = SessionRecord::default();
        assert!(record.legacy().is_none());
        assert!(record.modern().is_none());
    }
}
