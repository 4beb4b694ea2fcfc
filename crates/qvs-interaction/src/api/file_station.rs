use qvs_core::remote_file::{RemoteFile, remote_basename, remote_parent};
use qvs_core::session::EndpointFamily;
use qvs_core::{QvsError, Result};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;

use super::QvsClient;
use crate::gateway::{RawResponse, RequestBody};

pub(crate) const FILE_MANAGER_PATH: &str = "/cgi-bin/filemanager/utilRequest.cgi";

const LIST_LIMIT: &str = "500";

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    datas: Vec<RemoteFile>,
}

fn form(pairs: &[(&str, &str)]) -> RequestBody {
    RequestBody::Form(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

impl QvsClient<'_> {
    async fn file_manager(&self, func: &str, body: RequestBody) -> Result<RawResponse> {
        self.gateway
            .request(
                EndpointFamily::FileManager,
                Method::POST,
                FILE_MANAGER_PATH,
                &[("func", func)],
                body,
            )
            .await
    }

    /// Lists one NAS directory (first 500 entries, natural order).
    pub async fn list_dir(&self, path: &str) -> Result<Vec<RemoteFile>> {
        let raw = self
            .file_manager(
                "get_list",
                form(&[
                    ("path", path),
                    ("start", "0"),
                    ("limit", LIST_LIMIT),
                    ("sort", "natural"),
                    ("dir", "ASC"),
                ]),
            )
            .await?;
        Ok(raw.json::<ListResponse>()?.datas)
    }

    pub async fn create_dir(&self, dir: &str) -> Result<()> {
        let parent = remote_parent(dir);
        let folder = remote_basename(dir);
        self.file_manager(
            "createdir",
            form(&[("dest_path", parent.as_str()), ("dest_folder", folder.as_str())]),
        )
        .await?;
        Ok(())
    }

    /// Server-side copy. The file keeps its name; only the directory of
    /// `dest` is used.
    pub async fn copy_file(&self, source: &str, dest: &str) -> Result<()> {
        let source_file = remote_basename(source);
        let source_path = remote_parent(source);
        let dest_path = remote_parent(dest);
        tracing::debug!("Copying {} -> {}", source, dest_path);
        self.file_manager(
            "copy",
            form(&[
                ("source_total", "1"),
                ("mode", "0"),
                ("source_file", source_file.as_str()),
                ("source_path", source_path.as_str()),
                ("dest_path", dest_path.as_str()),
            ]),
        )
        .await?;
        Ok(())
    }

    pub async fn rename_file(&self, dir: &str, source_name: &str, dest_name: &str) -> Result<()> {
        self.file_manager(
            "rename",
            form(&[
                ("path", dir),
                ("source_name", source_name),
                ("dest_name", dest_name),
            ]),
        )
        .await?;
        Ok(())
    }

    /// Deletes a file or a folder with its contents.
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let parent = remote_parent(path);
        let name = remote_basename(path);
        self.file_manager(
            "delete",
            form(&[("path", parent.as_str()), ("file_total", "1"), ("file_name", name.as_str())]),
        )
        .await?;
        Ok(())
    }

    /// Uploads a local file to `remote_path`, overwriting any existing file.
    pub async fn upload_file(&self, local: &Path, remote_path: &str) -> Result<()> {
        let bytes = tokio::fs::read(local).await?;
        let file_name = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                QvsError::invalid_input(format!("not a file: {}", local.display()))
            })?;
        let mime = mime_guess::from_path(local).first_or_octet_stream();
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.essence_str())?;

        let dest_dir = remote_parent(remote_path);
        let progress = remote_path.replace('/', "-");
        tracing::debug!("Uploading {} -> {}", local.display(), remote_path);

        self.gateway
            .request(
                EndpointFamily::FileManager,
                Method::POST,
                FILE_MANAGER_PATH,
                &[
                    ("func", "upload"),
                    ("type", "standard"),
                    ("dest_path", dest_dir.as_str()),
                    ("overwrite", "1"),
                    ("progress", progress.as_str()),
                ],
                RequestBody::Multipart(Form::new().part("data", part)),
            )
            .await?;
        Ok(())
    }
}
