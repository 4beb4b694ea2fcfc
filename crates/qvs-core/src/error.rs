//! Error types for qvscli.

use thiserror::Error;

/// A shared error type for every qvscli library crate.
///
/// Session and gateway failures carry their own variants so that callers can
/// tell a missing login apart from a backend rejection. Infrastructure errors
/// are converted in through the `From` impls at the bottom of this file.
#[derive(Error, Debug, Clone)]
pub enum QvsError {
    /// No valid session exists; the user has to log in again.
    #[error("not logged in, run 'qvscli login'")]
    NotLoggedIn,

    /// The legacy login endpoint rejected the username/password/code.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The modern API root did not hand out a CSRF token and session id.
    #[error("failed to bootstrap QVS session: {0}")]
    SessionBootstrapFailed(String),

    /// The credential file could not be written.
    #[error(
        "failed to persist session to '{path}': {message}; you will have to run 'qvscli login' again next time"
    )]
    PersistFailed { path: String, message: String },

    /// The transport answered with a non-200 HTTP status.
    #[error("error making request, HTTP status code: {status_code}")]
    RequestFailed { status_code: u16 },

    /// The JSON envelope carried a status other than OK or deferred.
    #[error("error making request, response status was {code}: {detail}")]
    ApplicationError { code: i64, detail: String },

    /// The stored session record could not be decoded.
    #[error("corrupt session record at '{path}': {message}")]
    CorruptRecord { path: String, message: String },

    /// Entity not found error with type information
    #[error("{entity_type} '{id}' not found")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// HTTP transport error (connection refused, TLS, body read)
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad user input (empty username, invalid instance name, ...)
    #[error("{0}")]
    InvalidInput(String),

    /// An external command (genisoimage, mkisofs) failed
    #[error("{0}")]
    Command(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QvsError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Creates a CorruptRecord error
    pub fn corrupt_record(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a PersistFailed error
    pub fn persist_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PersistFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if the caller has to log in before retrying
    pub fn is_not_logged_in(&self) -> bool {
        matches!(self, Self::NotLoggedIn)
    }

    /// Check if this is an envelope-level error returned by QVS
    pub fn is_application_error(&self) -> bool {
        matches!(self, Self::ApplicationError { .. })
    }

    /// Returns the HTTP status code for `RequestFailed` errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status_code } => Some(*status_code),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for QvsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for QvsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for QvsError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::DeError> for QvsError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Serialization {
            format: "XML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for QvsError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::RequestFailed {
                status_code: status.as_u16(),
            },
            None => Self::Transport(err.to_string()),
        }
    }
}

impl From<minijinja::Error> for QvsError {
    fn from(err: minijinja::Error) -> Self {
        Self::Serialization {
            format: "template".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, QvsError>`.
pub type Result<T> = std::result::Result<T, QvsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_logged_in_names_login_command() {
        let msg = QvsError::NotLoggedIn.to_string();
        assert!(msg.contains("qvscli login"));
    }

    #[test]
    fn test_application_error_keeps_detail() {
        let err = QvsError::ApplicationError {
            code: 12,
            detail: "quota exceeded".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("quota exceeded"));
        assert!(err.is_application_error());
    }

    #[test]
    fn test_status_code_only_for_request_failed() {
        assert_eq!(
            QvsError::RequestFailed { status_code: 500 }.status_code(),
            Some(500)
        );
        assert_eq!(QvsError::NotLoggedIn.status_code(), None);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: QvsError = io.into();
        assert!(matches!(err, QvsError::Io { .. }));
    }
}
