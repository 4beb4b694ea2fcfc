use anyhow::{Result, bail};
use qvs_core::remote_file::{remote_join, remote_parent};
use qvs_core::vm::Vm;
use qvs_interaction::QvsClient;

use crate::context::AppContext;
use crate::output::{OutputFormat, print_json, print_table};
use crate::prompt::confirm_yes;

pub async fn list(ctx: &AppContext, output: OutputFormat) -> Result<()> {
    let session = ctx.connect().await?;
    let mut vms = QvsClient::new(&session).vm_list().await?;

    match output {
        OutputFormat::Json => print_json(&vms)?,
        OutputFormat::Text => {
            vms.sort_by_key(|vm| vm.name.to_lowercase());
            print_table(
                &["NAME", "ID", "STATE", "NETWORK", "MAC ADDRESS", "VNC PORT"],
                &rows(&vms),
            );
        }
    }
    Ok(())
}

fn rows(vms: &[Vm]) -> Vec<Vec<String>> {
    vms.iter()
        .map(|vm| {
            let (bridge, mac) = vm
                .primary_adapter()
                .map(|a| (a.bridge.clone(), a.mac.clone()))
                .unwrap_or_default();
            vec![
                vm.name.clone(),
                vm.id_string(),
                vm.power_state.clone(),
                bridge,
                mac,
                vm.vnc_port().map(|p| p.to_string()).unwrap_or_default(),
            ]
        })
        .collect()
}

pub async fn describe(ctx: &AppContext, id_or_name: &str) -> Result<()> {
    let session = ctx.connect().await?;
    let client = QvsClient::new(&session);
    let vm = client.vm_get(id_or_name).await?;
    let description = client.vm_describe(&vm.id_string()).await?;
    print_json(&description)
}

pub async fn start(ctx: &AppContext, id_or_name: &str) -> Result<()> {
    let session = ctx.connect().await?;
    let client = QvsClient::new(&session);
    let vm = client.vm_get(id_or_name).await?;
    client.vm_start(&vm.id_string()).await?;
    tracing::info!("Started VM: {}", id_or_name);
    Ok(())
}

pub async fn reset(ctx: &AppContext, id_or_name: &str) -> Result<()> {
    let session = ctx.connect().await?;
    let client = QvsClient::new(&session);
    let vm = client.vm_get(id_or_name).await?;
    client.vm_reset(&vm.id_string()).await?;
    tracing::info!("Reset VM: {}", id_or_name);
    Ok(())
}

pub async fn stop(ctx: &AppContext, id_or_name: &str, force: bool) -> Result<()> {
    let session = ctx.connect().await?;
    let client = QvsClient::new(&session);
    let vm = client.vm_get(id_or_name).await?;
    client.vm_shutdown(&vm.id_string(), force).await?;
    if force {
        tracing::info!("VM stopped: {}", id_or_name);
    } else {
        tracing::info!("Sent ACPI shutdown signal to VM: {}", id_or_name);
    }
    Ok(())
}

/// Confirms, force-stops a running VM, deletes it and then its disk folder.
pub async fn delete(
    ctx: &AppContext,
    id_or_name: &str,
    no_input: bool,
    no_disk_del: bool,
) -> Result<()> {
    let session = ctx.connect().await?;
    let client = QvsClient::new(&session);
    let vm = client.vm_get(id_or_name).await?;
    let id = vm.id_string();

    if !no_input && !confirm_yes(&format!("Delete VM '{}'?", vm.name))? {
        bail!("did not answer 'yes' to deleting '{}', aborting", vm.name);
    }

    if !vm.is_stopped() {
        tracing::warn!("Forcing shutdown of running VM: {}", id_or_name);
        client.vm_shutdown(&id, true).await?;
    }

    client.vm_delete(&id).await?;
    tracing::info!("Deleted VM: {}", id_or_name);

    if no_disk_del {
        tracing::warn!(
            "Skipping disk deletion, disk data remains on NAS: {}",
            remote_join(&ctx.config.disks_dir, &vm.name)
        );
        return Ok(());
    }

    if let Some(disk) = vm.disks.first() {
        match disk_folder(&disk.path, &ctx.config.disks_dir) {
            Some(folder) => {
                client.delete_file(&folder).await?;
                tracing::info!("Deleted VM disk folder: {}", folder);
            }
            None => tracing::warn!(
                "Skipping disk deletion, no VM-specific folder for disk '{}'",
                disk.path
            ),
        }
    }
    Ok(())
}

/// Folder holding a VM's disk, unless that would be a shared location (the
/// disks dir itself or a root).
fn disk_folder(disk_path: &str, disks_dir: &str) -> Option<String> {
    if disk_path.trim().is_empty() {
        return None;
    }
    let folder = remote_parent(disk_path);
    let shared = folder == "/"
        || folder == "."
        || folder.trim_end_matches('/') == disks_dir.trim_end_matches('/');
    (!shared).then_some(folder)
}
