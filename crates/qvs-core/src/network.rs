use serde::{Deserialize, Serialize};

/// Raw virtual switch entry from the network manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetMgrNetwork {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub vswitch_name: String,
    #[serde(default)]
    pub vswitch_ip: String,
    #[serde(default)]
    pub physical_nic: String,
}

/// A network a VM adapter can be bridged to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualNetwork {
    pub display_name: String,
    /// Bridge name passed as `bridge` when creating a VM.
    pub name: String,
    pub ip: String,
    pub nics: Vec<String>,
}

impl NetMgrNetwork {
    /// Entries without a display name are internal switches.
    pub fn is_user_visible(&self) -> bool {
        !self.display_name.is_empty()
    }
}

impl From<NetMgrNetwork> for VirtualNetwork {
    fn from(net: NetMgrNetwork) -> Self {
        Self {
            display_name: net.display_name,
            name: net.vswitch_name,
            ip: net.vswitch_ip,
            nics: vec![net.physical_nic],
        }
    }
}
