//! Credential store trait.
//!
//! Defines the interface for persisting the session record between
//! invocations.

use crate::error::Result;
use crate::session::SessionRecord;

/// Durable storage for exactly one [`SessionRecord`].
///
/// # Security Note
///
/// Implementations should ensure that:
/// - The backing file is readable by the owner only (600 on Unix)
/// - Session ids and tokens are never logged
///
/// There is no cross-process locking. Two concurrent logins race and the last
/// writer wins.
pub trait CredentialStore: Send + Sync {
    /// Loads the stored record.
    ///
    /// # Returns
    ///
    /// - `Ok(SessionRecord)`: Successfully loaded
    /// - `Err(QvsError::NotFound)`: Nothing stored (missing or empty file)
    /// - `Err(QvsError::CorruptRecord)`: Stored content is not a session record
    fn load(&self) -> Result<SessionRecord>;

    /// Replaces the stored record. Safe to call repeatedly.
    fn save(&self, record: &SessionRecord) -> Result<()>;

    /// Removes the stored record. Succeeds when nothing was stored.
    fn clear(&self) -> Result<()>;

    /// Human-readable location, used in messages.
    fn location(&self) -> String;
}
