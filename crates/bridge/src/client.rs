//! The facade the client context calls.
//!
//! Each method shapes one typed request, sends it over the transport,
//! and unwraps exactly one response kind. Every operation except the
//! support check is gated on `initialize()` having succeeded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use opfs_explorer_protocol::{
    BridgeRequest, DirectoryStats, DiskUsage, FileTreeNode, ItemStat, NodeKind, ResponseBody,
};

use crate::error::BridgeError;
use crate::transport::BridgeTransport;

pub struct BridgeClient {
    transport: Arc<dyn BridgeTransport>,
    initialized: AtomicBool,
}

impl BridgeClient {
    pub fn new(transport: Arc<dyn BridgeTransport>) -> Self {
        Self {
            transport,
            initialized: AtomicBool::new(false),
        }
    }

    /// One support-check round-trip; flips the gate on success.
    /// Idempotent: calling again while initialized is a no-op.
    pub async fn initialize(&self) -> Result<(), BridgeError> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }
        match self.request_unchecked(BridgeRequest::CheckSupport).await? {
            ResponseBody::CheckSupport { supported: true } => {
                self.initialized.store(true, Ordering::SeqCst);
                Ok(())
            }
            ResponseBody::CheckSupport { supported: false } => Err(BridgeError::Unsupported),
            other => Err(unexpected("check-support", &other)),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub async fn read_file(&self, path: &str) -> Result<String, BridgeError> {
        match self
            .request(BridgeRequest::ReadFile {
                file_path: path.into(),
            })
            .await?
        {
            ResponseBody::ReadFile { content } => Ok(content),
            other => Err(unexpected("read-file", &other)),
        }
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<(), BridgeError> {
        self.expect_done(BridgeRequest::WriteFile {
            file_path: path.into(),
            content: content.into(),
        })
        .await
    }

    pub async fn create_file(&self, path: &str, content: &str) -> Result<(), BridgeError> {
        self.expect_done(BridgeRequest::CreateFile {
            file_path: path.into(),
            content: content.into(),
        })
        .await
    }

    pub async fn create_folder(&self, path: &str) -> Result<(), BridgeError> {
        self.expect_done(BridgeRequest::CreateFolder {
            folder_path: path.into(),
        })
        .await
    }

    pub async fn delete_file(&self, path: &str) -> Result<(), BridgeError> {
        self.expect_done(BridgeRequest::DeleteItem {
            item_path: path.into(),
            item_type: Some(NodeKind::File),
        })
        .await
    }

    /// Recursive: removes the folder and everything beneath it.
    pub async fn delete_folder(&self, path: &str) -> Result<(), BridgeError> {
        self.expect_done(BridgeRequest::DeleteItem {
            item_path: path.into(),
            item_type: Some(NodeKind::Folder),
        })
        .await
    }

    /// Sorted entry names of a directory.
    pub async fn readdir(&self, path: &str) -> Result<Vec<String>, BridgeError> {
        match self
            .request(BridgeRequest::ListDirectory {
                dir_path: path.into(),
            })
            .await?
        {
            ResponseBody::ListDirectory { entries } => Ok(entries),
            other => Err(unexpected("list-directory", &other)),
        }
    }

    pub async fn stat(&self, path: &str) -> Result<ItemStat, BridgeError> {
        match self
            .request(BridgeRequest::StatItem {
                item_path: path.into(),
            })
            .await?
        {
            ResponseBody::StatItem {
                is_directory,
                kind,
                mode,
            } => Ok(ItemStat {
                is_directory,
                kind,
                mode,
            }),
            other => Err(unexpected("stat-item", &other)),
        }
    }

    /// Whether a path exists; operation-level failures read as absent.
    pub async fn exists(&self, path: &str) -> Result<bool, BridgeError> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(BridgeError::Operation(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn file_tree(&self) -> Result<Vec<FileTreeNode>, BridgeError> {
        match self.request(BridgeRequest::GetFileTree).await? {
            ResponseBody::GetFileTree { file_tree } => Ok(file_tree),
            other => Err(unexpected("get-file-tree", &other)),
        }
    }

    pub async fn disk_usage(&self) -> Result<DiskUsage, BridgeError> {
        match self.request(BridgeRequest::GetStorageEstimate).await? {
            ResponseBody::GetStorageEstimate {
                quota,
                usage,
                available,
            } => Ok(DiskUsage {
                quota,
                usage,
                available,
            }),
            other => Err(unexpected("get-storage-estimate", &other)),
        }
    }

    pub async fn directory_stats(&self, path: &str) -> Result<DirectoryStats, BridgeError> {
        match self
            .request(BridgeRequest::GetDirectoryStats {
                dir_path: path.into(),
            })
            .await?
        {
            ResponseBody::GetDirectoryStats { stats } => Ok(stats),
            other => Err(unexpected("get-directory-stats", &other)),
        }
    }

    pub async fn empty_directory(&self, path: &str) -> Result<(), BridgeError> {
        self.expect_done(BridgeRequest::EmptyDirectory {
            dir_path: path.into(),
        })
        .await
    }

    pub async fn clear_all(&self) -> Result<(), BridgeError> {
        self.expect_done(BridgeRequest::ClearAll).await
    }

    async fn expect_done(&self, request: BridgeRequest) -> Result<(), BridgeError> {
        let op = request.kind();
        match self.request(request).await? {
            ResponseBody::Done => Ok(()),
            other => Err(unexpected(op, &other)),
        }
    }

    async fn request(&self, request: BridgeRequest) -> Result<ResponseBody, BridgeError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(BridgeError::Uninitialized);
        }
        self.request_unchecked(request).await
    }

    async fn request_unchecked(
        &self,
        request: BridgeRequest,
    ) -> Result<ResponseBody, BridgeError> {
        let response = self.transport.send(request).await?;
        response.into_result().map_err(BridgeError::Operation)
    }
}

fn unexpected(op: &str, body: &ResponseBody) -> BridgeError {
    BridgeError::Protocol(format!("unexpected response body for {op}: {body:?}"))
}
