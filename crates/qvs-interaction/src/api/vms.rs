use qvs_core::remote_file::{remote_basename, remote_join, remote_parent};
use qvs_core::vm::{Vm, VmCreateRequest, VmSpec};
use qvs_core::{QvsError, Result};
use reqwest::Method;
use serde_json::{Value, json};

use super::QvsClient;

const VMS_PATH: &str = "/qvs/vms";
const MAC_PATH: &str = "/qvs/vms/mac";

/// Power actions exposed under `/qvs/vms/<id>/<action>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Start,
    Reset,
    Shutdown,
    ForceShutdown,
}

impl PowerAction {
    fn as_path(self) -> &'static str {
        match self {
            PowerAction::Start => "start",
            PowerAction::Reset => "reset",
            PowerAction::Shutdown => "shutdown",
            PowerAction::ForceShutdown => "forceshutdown",
        }
    }
}

impl QvsClient<'_> {
    /// Asks QVS for an unused MAC address.
    pub async fn mac_create(&self) -> Result<String> {
        self.gateway.qvs(Method::GET, MAC_PATH, None).await
    }

    pub async fn vm_list(&self) -> Result<Vec<Vm>> {
        self.gateway.qvs(Method::GET, VMS_PATH, None).await
    }

    /// Looks a VM up by exact name or numeric id.
    pub async fn vm_get(&self, id_or_name: &str) -> Result<Vm> {
        self.vm_list()
            .await?
            .into_iter()
            .find(|vm| vm.matches(id_or_name))
            .ok_or_else(|| QvsError::not_found("VM", id_or_name))
    }

    /// Full VM description as returned by QVS, without interpretation.
    pub async fn vm_describe(&self, id: &str) -> Result<Value> {
        self.gateway
            .qvs_value(Method::GET, &vm_path(id), None)
            .await
    }

    pub async fn vm_create(&self, spec: &VmSpec) -> Result<()> {
        let request = VmCreateRequest::try_from(spec)?;
        self.gateway
            .qvs_value(Method::POST, VMS_PATH, Some(serde_json::to_value(&request)?))
            .await?;
        tracing::info!("Created VM {}", spec.name);
        Ok(())
    }

    pub async fn vm_power(&self, id: &str, action: PowerAction) -> Result<()> {
        let path = format!("{}/{}", vm_path(id), action.as_path());
        self.gateway
            .qvs_value(Method::POST, &path, Some(json!({})))
            .await?;
        Ok(())
    }

    pub async fn vm_start(&self, id: &str) -> Result<()> {
        self.vm_power(id, PowerAction::Start).await
    }

    pub async fn vm_reset(&self, id: &str) -> Result<()> {
        self.vm_power(id, PowerAction::Reset).await
    }

    pub async fn vm_shutdown(&self, id: &str, force: bool) -> Result<()> {
        let action = if force {
            PowerAction::ForceShutdown
        } else {
            PowerAction::Shutdown
        };
        self.vm_power(id, action).await
    }

    pub async fn vm_delete(&self, id: &str) -> Result<()> {
        self.gateway
            .qvs_value(Method::DELETE, &vm_path(id), Some(json!({})))
            .await?;
        Ok(())
    }

    /// Copies the first disk of a stopped VM into `snapshot_dir` as
    /// `qvs-snap-<name>.img` and returns the new path.
    pub async fn vm_disk_snapshot_create(
        &self,
        id_or_name: &str,
        name: &str,
        snapshot_dir: &str,
    ) -> Result<String> {
        let vm = self.vm_get(id_or_name).await?;
        if !vm.is_stopped() {
            return Err(QvsError::invalid_input(
                "VM must be stopped before creating disk snapshot",
            ));
        }
        let disk = vm.disks.first().ok_or_else(|| {
            QvsError::invalid_input(format!("VM '{}' has no disk to snapshot", vm.name))
        })?;

        let source = disk.root_path.as_str();
        let source_name = remote_basename(source);
        let snapshot_name = format!("qvs-snap-{}.img", name);

        self.ensure_dir(snapshot_dir).await?;
        self.copy_file(source, &remote_join(snapshot_dir, &source_name))
            .await?;
        self.rename_file(snapshot_dir, &source_name, &snapshot_name)
            .await?;

        Ok(remote_join(snapshot_dir, &snapshot_name))
    }

    /// Creates `dir` unless its parent already lists a folder of that name.
    pub async fn ensure_dir(&self, dir: &str) -> Result<()> {
        let base = remote_basename(dir);
        let exists = self
            .list_dir(&remote_parent(dir))
            .await?
            .iter()
            .any(|f| f.filename == base && f.is_folder());
        if !exists {
            tracing::debug!("Creating directory {}", dir);
            self.create_dir(dir).await?;
        }
        Ok(())
    }
}

fn vm_path(id: &str) -> String {
    format!("{}/{}", VMS_PATH, id)
}
