pub mod config;
pub mod credential;
pub mod error;
pub mod network;
pub mod remote_file;
pub mod session;
pub mod vm;

// Re-export common error type
pub use error::{QvsError, Result};
