use anyhow::Result;
use qvs_core::remote_file::{RemoteFile, remote_join};
use qvs_interaction::QvsClient;

use crate::context::AppContext;
use crate::output::{OutputFormat, print_json, print_table};

pub async fn list(ctx: &AppContext, path: &str, output: OutputFormat) -> Result<()> {
    let session = ctx.connect().await?;
    let list_path = remote_join(&ctx.config.images_dir, path);
    let mut files = QvsClient::new(&session).list_dir(&list_path).await?;

    match output {
        OutputFormat::Json => print_json(&files)?,
        OutputFormat::Text => {
            files.sort_by_key(|f| f.filename.to_lowercase());
            print_table(&["NAME"], &rows(path, &files));
        }
    }
    Ok(())
}

/// Image files and folders, shown relative to the images dir. Folders get a
/// trailing slash.
fn rows(prefix: &str, files: &[RemoteFile]) -> Vec<Vec<String>> {
    files
        .iter()
        .filter(|f| f.is_image_candidate())
        .map(|f| {
            let mut name = remote_join(prefix, &f.filename);
            if f.is_folder() {
                name.push('/');
            }
            vec![name]
        })
        .collect()
}
