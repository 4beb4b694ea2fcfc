use qvs_core::Result;
use qvs_core::network::{NetMgrNetwork, VirtualNetwork};
use qvs_core::session::EndpointFamily;
use reqwest::Method;

use super::QvsClient;
use crate::gateway::RequestBody;

pub(crate) const NET_MANAGER_LIST_PATH: &str = "/netmgr/api.php/list";

impl QvsClient<'_> {
    /// Raw virtual switch list, internal switches included.
    pub async fn netmgr_list(&self) -> Result<Vec<NetMgrNetwork>> {
        self.gateway
            .request(
                EndpointFamily::NetManager,
                Method::GET,
                NET_MANAGER_LIST_PATH,
                &[],
                RequestBody::Empty,
            )
            .await?
            .json()
    }

    /// Networks a VM can be attached to.
    pub async fn list_networks(&self) -> Result<Vec<VirtualNetwork>> {
        Ok(self
            .netmgr_list()
            .await?
            .into_iter()
            .filter(NetMgrNetwork::is_user_visible)
            .map(VirtualNetwork::from)
            .collect())
    }
}
