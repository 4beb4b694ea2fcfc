//! Typed wrappers over the QVS, File Station and Network Manager endpoints.

mod file_station;
mod net_manager;
mod vms;

pub use vms::PowerAction;

use crate::gateway::Gateway;
use crate::session_manager::SessionManager;

/// Domain operations against one NAS.
///
/// Built from an active [`SessionManager`]; every call is a single sequential
/// request (or a short fixed sequence of them) through the [`Gateway`].
#[derive(Clone, Copy)]
pub struct QvsClient<'a> {
    gateway: Gateway<'a>,
}

impl<'a> QvsClient<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self {
            gateway: Gateway::new(session),
        }
    }

    pub fn gateway(&self) -> Gateway<'a> {
        self.gateway
    }
}
