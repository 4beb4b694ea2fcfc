use anyhow::{Result, anyhow};
use qvs_core::remote_file::{RemoteFile, remote_basename, remote_join};
use qvs_interaction::QvsClient;

use crate::context::AppContext;
use crate::output::print_table;

pub async fn list(ctx: &AppContext) -> Result<()> {
    let session = ctx.connect().await?;
    let files = QvsClient::new(&session)
        .list_dir(&ctx.snapshot_dir())
        .await?;
    print_table(&["NAME", "TIMESTAMP"], &rows(&files));
    Ok(())
}

fn rows(files: &[RemoteFile]) -> Vec<Vec<String>> {
    files
        .iter()
        .filter(|f| !f.is_folder())
        .map(|f| vec![f.filename.clone(), f.mt.clone()])
        .collect()
}

pub async fn create(ctx: &AppContext, vm: &str, name: &str) -> Result<()> {
    let session = ctx.connect().await?;
    let snapshot = QvsClient::new(&session)
        .vm_disk_snapshot_create(vm, name, &ctx.snapshot_dir())
        .await?;
    tracing::info!("Created disk snapshot {}", snapshot);
    Ok(())
}

pub async fn delete(ctx: &AppContext, file: &str) -> Result<()> {
    let session = ctx.connect().await?;
    let client = QvsClient::new(&session);
    let dir = ctx.snapshot_dir();
    let files = client.list_dir(&dir).await?;

    let found = files
        .iter()
        .find(|f| remote_basename(&f.filename) == file)
        .ok_or_else(|| anyhow!("failed to find snapshot file '{}' in snapshot directory", file))?;

    tracing::info!("Deleting snapshot file: {}", found.filename);
    client.delete_file(&remote_join(&dir, &found.filename)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_skip_folders() {
        let files = vec![
            RemoteFile {
                filename: "qvs-snap-pre-upgrade.img".into(),
                isfolder: 0,
                mt: "2024/01/02 10:11:12".into(),
                epochmt: 0,
            },
            RemoteFile {
                filename: "old".into(),
                isfolder: 1,
                ..Default::default()
            },
        ];
        assert_eq!(
            rows(&files),
            vec![vec![
                "qvs-snap-pre-upgrade.img".to_string(),
                "2024/01/02 10:11:12".to_string()
            ]]
        );
    }
}
