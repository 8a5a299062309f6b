//! Bridge operation requests and responses.
//!
//! Requests form a closed discriminated union keyed by `type`; responses
//! carry an explicit `status` discriminant so success is never inferred
//! from the absence of an error field.

use serde::{Deserialize, Serialize};

use crate::types::{DirectoryStats, FileTreeNode, ItemStat, NodeKind};

/// A typed operation request sent from the client context to the context
/// holding live storage handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BridgeRequest {
    CheckSupport,
    #[serde(rename_all = "camelCase")]
    ListDirectory { dir_path: String },
    #[serde(rename_all = "camelCase")]
    ReadFile { file_path: String },
    #[serde(rename_all = "camelCase")]
    WriteFile { file_path: String, content: String },
    #[serde(rename_all = "camelCase")]
    CreateFile { file_path: String, content: String },
    #[serde(rename_all = "camelCase")]
    CreateFolder { folder_path: String },
    #[serde(rename_all = "camelCase")]
    DeleteItem {
        item_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_type: Option<NodeKind>,
    },
    #[serde(rename_all = "camelCase")]
    StatItem { item_path: String },
    GetFileTree,
    GetStorageEstimate,
    #[serde(rename_all = "camelCase")]
    GetDirectoryStats { dir_path: String },
    #[serde(rename_all = "camelCase")]
    EmptyDirectory { dir_path: String },
    ClearAll,
}

impl BridgeRequest {
    /// The wire tag of this operation, for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CheckSupport => "check-support",
            Self::ListDirectory { .. } => "list-directory",
            Self::ReadFile { .. } => "read-file",
            Self::WriteFile { .. } => "write-file",
            Self::CreateFile { .. } => "create-file",
            Self::CreateFolder { .. } => "create-folder",
            Self::DeleteItem { .. } => "delete-item",
            Self::StatItem { .. } => "stat-item",
            Self::GetFileTree => "get-file-tree",
            Self::GetStorageEstimate => "get-storage-estimate",
            Self::GetDirectoryStats { .. } => "get-directory-stats",
            Self::EmptyDirectory { .. } => "empty-directory",
            Self::ClearAll => "clear-all",
        }
    }
}

/// Operation-specific success payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum ResponseBody {
    CheckSupport {
        supported: bool,
    },
    ListDirectory {
        entries: Vec<String>,
    },
    ReadFile {
        content: String,
    },
    /// Acknowledgement for mutations that return no data
    /// (write/create/delete/empty/clear).
    Done,
    #[serde(rename_all = "camelCase")]
    StatItem {
        is_directory: bool,
        #[serde(rename = "type")]
        kind: crate::types::ItemKind,
        mode: u32,
    },
    #[serde(rename_all = "camelCase")]
    GetFileTree {
        file_tree: Vec<FileTreeNode>,
    },
    GetStorageEstimate {
        quota: Option<u64>,
        usage: Option<u64>,
        available: Option<u64>,
    },
    GetDirectoryStats {
        stats: DirectoryStats,
    },
}

impl From<ItemStat> for ResponseBody {
    fn from(stat: ItemStat) -> Self {
        Self::StatItem {
            is_directory: stat.is_directory,
            kind: stat.kind,
            mode: stat.mode,
        }
    }
}

/// The outcome of a dispatched operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum BridgeResponse {
    Ok { result: ResponseBody },
    Error { error: String },
}

impl BridgeResponse {
    pub fn ok(result: ResponseBody) -> Self {
        Self::Ok { result }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Unwrap into the success payload or the error message.
    pub fn into_result(self) -> Result<ResponseBody, String> {
        match self {
            Self::Ok { result } => Ok(result),
            Self::Error { error } => Err(error),
        }
    }
}
