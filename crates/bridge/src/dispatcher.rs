//! Operation dispatch on the side holding live storage handles.
//!
//! Every handler re-resolves from a fresh root handle; no handle survives
//! past the operation that obtained it.

use std::sync::Arc;

use opfs_explorer_protocol::{
    BridgeRequest, BridgeResponse, DiskUsage, ItemStat, ResponseBody,
};
use opfs_explorer_vfs::{
    build_tree, compute_stats, join, normalize, resolve_directory, resolve_parent_and_name,
    split_segments, DirectoryHandle, Result, SandboxStore, VfsError,
};

/// Maps operation requests to storage mutations and queries.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn SandboxStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn SandboxStore>) -> Self {
        Self { store }
    }

    /// Execute one request and shape the outcome for the wire.
    pub async fn dispatch(&self, request: BridgeRequest) -> BridgeResponse {
        let op = request.kind();
        tracing::debug!(op, "dispatching bridge operation");
        match self.handle(request).await {
            Ok(body) => BridgeResponse::ok(body),
            Err(err) => {
                tracing::debug!(op, error = %err, "operation failed");
                BridgeResponse::error(err.to_string())
            }
        }
    }

    async fn handle(&self, request: BridgeRequest) -> Result<ResponseBody> {
        match request {
            BridgeRequest::CheckSupport => Ok(ResponseBody::CheckSupport {
                supported: self.store.supported(),
            }),
            BridgeRequest::ListDirectory { dir_path } => self.list_directory(&dir_path).await,
            BridgeRequest::ReadFile { file_path } => self.read_file(&file_path).await,
            BridgeRequest::WriteFile { file_path, content }
            | BridgeRequest::CreateFile { file_path, content } => {
                self.write_file(&file_path, &content).await
            }
            BridgeRequest::CreateFolder { folder_path } => self.create_folder(&folder_path).await,
            BridgeRequest::DeleteItem { item_path, .. } => self.delete_item(&item_path).await,
            BridgeRequest::StatItem { item_path } => self.stat_item(&item_path).await,
            BridgeRequest::GetFileTree => self.file_tree().await,
            BridgeRequest::GetStorageEstimate => self.storage_estimate().await,
            BridgeRequest::GetDirectoryStats { dir_path } => self.directory_stats(&dir_path).await,
            BridgeRequest::EmptyDirectory { dir_path } => self.empty_directory(&dir_path).await,
            BridgeRequest::ClearAll => self.empty_directory("/").await,
        }
    }

    async fn list_directory(&self, dir_path: &str) -> Result<ResponseBody> {
        let dir = resolve_directory(self.store.root().await?, dir_path).await?;
        let mut entries: Vec<String> = dir
            .entries()
            .await
            .map_err(|e| e.with_path(&normalize(dir_path)))?
            .into_iter()
            .map(|e| e.name)
            .collect();
        entries.sort();
        Ok(ResponseBody::ListDirectory { entries })
    }

    async fn read_file(&self, file_path: &str) -> Result<ResponseBody> {
        let (parent, name) =
            resolve_parent_and_name(self.store.root().await?, file_path).await?;
        let file = parent
            .file(&name, false)
            .await
            .map_err(|e| e.with_path(&normalize(file_path)))?;
        let bytes = file.read().await?;
        Ok(ResponseBody::ReadFile {
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Writes create the target file if missing, but never its parents.
    async fn write_file(&self, file_path: &str, content: &str) -> Result<ResponseBody> {
        let (parent, name) =
            resolve_parent_and_name(self.store.root().await?, file_path).await?;
        let file = parent
            .file(&name, true)
            .await
            .map_err(|e| e.with_path(&normalize(file_path)))?;
        file.write(content.as_bytes()).await?;
        Ok(ResponseBody::Done)
    }

    /// Creation is if-not-exists: an existing folder at the path is a no-op.
    async fn create_folder(&self, folder_path: &str) -> Result<ResponseBody> {
        let (parent, name) =
            resolve_parent_and_name(self.store.root().await?, folder_path).await?;
        parent
            .directory(&name, true)
            .await
            .map_err(|e| e.with_path(&normalize(folder_path)))?;
        Ok(ResponseBody::Done)
    }

    async fn delete_item(&self, item_path: &str) -> Result<ResponseBody> {
        let (parent, name) =
            resolve_parent_and_name(self.store.root().await?, item_path).await?;
        parent
            .remove(&name, true)
            .await
            .map_err(|e| e.with_path(&normalize(item_path)))?;
        Ok(ResponseBody::Done)
    }

    async fn stat_item(&self, item_path: &str) -> Result<ResponseBody> {
        if split_segments(item_path)?.is_empty() {
            // the root itself
            return Ok(ItemStat::directory().into());
        }
        let (parent, name) =
            resolve_parent_and_name(self.store.root().await?, item_path).await?;
        match parent.directory(&name, false).await {
            Ok(_) => Ok(ItemStat::directory().into()),
            Err(VfsError::NotAFolder { .. }) => Ok(ItemStat::file().into()),
            Err(err) => Err(err.with_path(&normalize(item_path))),
        }
    }

    async fn file_tree(&self) -> Result<ResponseBody> {
        let root = self.store.root().await?;
        let file_tree = build_tree(root.as_ref(), "/").await?;
        Ok(ResponseBody::GetFileTree { file_tree })
    }

    async fn storage_estimate(&self) -> Result<ResponseBody> {
        let estimate = self.store.estimate().await?;
        let usage = DiskUsage::from_estimate(estimate.quota, estimate.usage);
        Ok(ResponseBody::GetStorageEstimate {
            quota: usage.quota,
            usage: usage.usage,
            available: usage.available,
        })
    }

    async fn directory_stats(&self, dir_path: &str) -> Result<ResponseBody> {
        let dir = resolve_directory(self.store.root().await?, dir_path).await?;
        let stats = compute_stats(dir.as_ref(), dir_path).await?;
        Ok(ResponseBody::GetDirectoryStats { stats })
    }

    /// Best-effort: entries that fail to delete are logged and skipped;
    /// the aggregate still reports success.
    async fn empty_directory(&self, dir_path: &str) -> Result<ResponseBody> {
        let dir = resolve_directory(self.store.root().await?, dir_path).await?;
        let entries = dir
            .entries()
            .await
            .map_err(|e| e.with_path(&normalize(dir_path)))?;
        for entry in entries {
            if let Err(err) = dir.remove(&entry.name, true).await {
                tracing::warn!(
                    path = %join(dir_path, &entry.name),
                    error = %err,
                    "entry survived best-effort removal"
                );
            }
        }
        Ok(ResponseBody::Done)
    }
}
