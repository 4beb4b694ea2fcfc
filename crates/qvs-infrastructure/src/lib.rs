pub mod cloud_init;
pub mod credential_store;
pub mod paths;
pub mod storage;

pub use crate::credential_store::FileCredentialStore;
pub use crate::paths::{PathError, QvsPaths};
