//! Tree, stats, and usage snapshots returned by bridge operations.

use serde::{Deserialize, Serialize};

/// Fixed mode constant reported for files (not a real permission bit).
pub const FILE_MODE: u32 = 0o644;
/// Fixed mode constant reported for directories.
pub const DIR_MODE: u32 = 0o755;

/// Node classification used in file trees and deletion hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

impl NodeKind {
    pub const fn is_folder(self) -> bool {
        matches!(self, Self::Folder)
    }
}

/// One node of a materialized file tree.
///
/// `id` always equals `path`; `children` is present (possibly empty) exactly
/// when the node is a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTreeNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileTreeNode>>,
}

impl FileTreeNode {
    /// Build a file (leaf) node.
    pub fn file(path: impl Into<String>, name: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: path.clone(),
            name: name.into(),
            kind: NodeKind::File,
            path,
            children: None,
        }
    }

    /// Build a folder (branch) node with its already-materialized children.
    pub fn folder(
        path: impl Into<String>,
        name: impl Into<String>,
        children: Vec<FileTreeNode>,
    ) -> Self {
        let path = path.into();
        Self {
            id: path.clone(),
            name: name.into(),
            kind: NodeKind::Folder,
            path,
            children: Some(children),
        }
    }
}

/// Aggregate snapshot of a subtree, recomputed on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub file_count: u64,
    pub folder_count: u64,
    pub total_size: u64,
    pub path: String,
}

/// Point-in-time storage quota estimate from the host.
///
/// `available` is `quota - usage` when both are known, otherwise null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub quota: Option<u64>,
    pub usage: Option<u64>,
    pub available: Option<u64>,
}

impl DiskUsage {
    /// Derive `available` from quota and usage.
    pub fn from_estimate(quota: Option<u64>, usage: Option<u64>) -> Self {
        let available = match (quota, usage) {
            (Some(q), Some(u)) => Some(q.saturating_sub(u)),
            _ => None,
        };
        Self {
            quota,
            usage,
            available,
        }
    }
}

/// Classification reported by stat-item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Directory,
}

/// Result of a stat-item operation.
///
/// `mode` is a fixed constant (0o644 for files, 0o755 for directories),
/// not a real permission bit from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStat {
    pub is_directory: bool,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub mode: u32,
}

impl ItemStat {
    pub const fn file() -> Self {
        Self {
            is_directory: false,
            kind: ItemKind::File,
            mode: FILE_MODE,
        }
    }

    pub const fn directory() -> Self {
        Self {
            is_directory: true,
            kind: ItemKind::Directory,
            mode: DIR_MODE,
        }
    }
}
