//! HTTP side of qvscli: session handling, the authenticated gateway and the
//! typed NAS API built on top of it.

pub mod api;
pub mod gateway;
pub mod prompter;
pub mod session_manager;

pub use api::{PowerAction, QvsClient};
pub use gateway::{Envelope, Gateway, RawResponse, RequestBody};
pub use prompter::{Credentials, Prompter};
pub use session_manager::{LoginReport, SessionManager};
