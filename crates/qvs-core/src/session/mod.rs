//! Session domain: the persisted record, lifecycle states and the QTS login
//! handshake.

pub mod login;
pub mod record;
pub mod state;

pub use login::{LoginForm, LoginHandshake, LoginPhase, LoginResponse};
pub use record::{LegacySession, ModernSession, SessionRecord};
pub use state::{ApiGeneration, EndpointFamily, SessionState};
