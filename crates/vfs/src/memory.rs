//! In-memory storage graph for testing and ephemeral hosts.
//!
//! Directories are shared nodes, so a child handle obtained earlier
//! observes mutations made through any other handle, the same way live
//! sandbox handles do.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{Result, VfsError};
use crate::handle::{
    DirEntry, DirectoryHandle, EntryKind, FileHandle, SandboxStore, StorageEstimate,
};
use crate::navigator::split_segments;

type DirRef = Arc<RwLock<DirNode>>;
type FileRef = Arc<RwLock<Vec<u8>>>;

#[derive(Default)]
struct DirNode {
    entries: HashMap<String, Node>,
}

#[derive(Clone)]
enum Node {
    File(FileRef),
    Folder(DirRef),
}

/// In-memory sandbox store.
///
/// All data lives on the heap and is lost on drop. Thread-safe via
/// per-node locks.
pub struct MemoryStore {
    root: DirRef,
    quota: Option<u64>,
    supported: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with no quota limit reported.
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(DirNode::default())),
            quota: None,
            supported: true,
        }
    }

    /// Create an empty store reporting the given quota.
    pub fn with_quota(quota: u64) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new()
        }
    }

    /// A store whose environment reports no sandboxed storage at all.
    pub fn unavailable() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Create with initial file contents, building parent directories.
    pub fn with_files(files: Vec<(&str, &str)>) -> Self {
        let store = Self::new();
        for (path, content) in files {
            store.seed(path, content.as_bytes());
        }
        store
    }

    fn seed(&self, path: &str, content: &[u8]) {
        let segments = split_segments(path).unwrap_or_default();
        let Some((name, parents)) = segments.split_last() else {
            return;
        };
        let mut current = self.root.clone();
        for parent in parents {
            let next = {
                let mut node = current.write().unwrap_or_else(std::sync::PoisonError::into_inner);
                match node
                    .entries
                    .entry((*parent).to_string())
                    .or_insert_with(|| Node::Folder(Arc::new(RwLock::new(DirNode::default()))))
                {
                    Node::Folder(dir) => dir.clone(),
                    Node::File(_) => return,
                }
            };
            current = next;
        }
        let mut node = current.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        node.entries
            .insert((*name).to_string(), Node::File(Arc::new(RwLock::new(content.to_vec()))));
    }

    fn usage_of(dir: &DirRef) -> u64 {
        let Ok(node) = dir.read() else { return 0 };
        node.entries
            .values()
            .map(|entry| match entry {
                Node::File(data) => data.read().map(|d| d.len() as u64).unwrap_or(0),
                Node::Folder(child) => Self::usage_of(child),
            })
            .sum()
    }
}

#[async_trait]
impl SandboxStore for MemoryStore {
    fn supported(&self) -> bool {
        self.supported
    }

    async fn root(&self) -> Result<Box<dyn DirectoryHandle>> {
        if !self.supported {
            return Err(VfsError::Unsupported);
        }
        Ok(Box::new(MemoryDirHandle {
            node: self.root.clone(),
        }))
    }

    async fn estimate(&self) -> Result<StorageEstimate> {
        if !self.supported {
            return Err(VfsError::Unsupported);
        }
        Ok(StorageEstimate {
            quota: self.quota,
            usage: Some(Self::usage_of(&self.root)),
        })
    }
}

struct MemoryDirHandle {
    node: DirRef,
}

impl std::fmt::Debug for MemoryDirHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDirHandle").finish_non_exhaustive()
    }
}

impl MemoryDirHandle {
    fn lock_read(&self) -> Result<std::sync::RwLockReadGuard<'_, DirNode>> {
        self.node
            .read()
            .map_err(|_| VfsError::storage("lock poisoned"))
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, DirNode>> {
        self.node
            .write()
            .map_err(|_| VfsError::storage("lock poisoned"))
    }
}

#[async_trait]
impl DirectoryHandle for MemoryDirHandle {
    async fn entries(&self) -> Result<Vec<DirEntry>> {
        let node = self.lock_read()?;
        Ok(node
            .entries
            .iter()
            .map(|(name, entry)| DirEntry {
                name: name.clone(),
                kind: match entry {
                    Node::File(_) => EntryKind::File,
                    Node::Folder(_) => EntryKind::Folder,
                },
            })
            .collect())
    }

    async fn directory(&self, name: &str, create: bool) -> Result<Box<dyn DirectoryHandle>> {
        let mut node = self.lock_write()?;
        match node.entries.get(name) {
            Some(Node::Folder(dir)) => Ok(Box::new(MemoryDirHandle { node: dir.clone() })),
            Some(Node::File(_)) => Err(VfsError::NotAFolder { path: name.into() }),
            None if create => {
                let dir: DirRef = Arc::new(RwLock::new(DirNode::default()));
                node.entries
                    .insert(name.to_string(), Node::Folder(dir.clone()));
                Ok(Box::new(MemoryDirHandle { node: dir }))
            }
            None => Err(VfsError::not_found(name)),
        }
    }

    async fn file(&self, name: &str, create: bool) -> Result<Box<dyn FileHandle>> {
        let mut node = self.lock_write()?;
        match node.entries.get(name) {
            Some(Node::File(data)) => Ok(Box::new(MemoryFileHandle { data: data.clone() })),
            Some(Node::Folder(_)) => Err(VfsError::NotAFile { path: name.into() }),
            None if create => {
                let data: FileRef = Arc::new(RwLock::new(Vec::new()));
                node.entries
                    .insert(name.to_string(), Node::File(data.clone()));
                Ok(Box::new(MemoryFileHandle { data }))
            }
            None => Err(VfsError::not_found(name)),
        }
    }

    async fn remove(&self, name: &str, recursive: bool) -> Result<()> {
        let mut node = self.lock_write()?;
        match node.entries.get(name) {
            Some(Node::Folder(dir)) if !recursive => {
                let empty = dir
                    .read()
                    .map_err(|_| VfsError::storage("lock poisoned"))?
                    .entries
                    .is_empty();
                if !empty {
                    return Err(VfsError::storage(format!("directory not empty: {name}")));
                }
                node.entries.remove(name);
                Ok(())
            }
            Some(_) => {
                node.entries.remove(name);
                Ok(())
            }
            None => Err(VfsError::not_found(name)),
        }
    }
}

struct MemoryFileHandle {
    data: FileRef,
}

impl std::fmt::Debug for MemoryFileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFileHandle").finish_non_exhaustive()
    }
}

#[async_trait]
impl FileHandle for MemoryFileHandle {
    async fn read(&self) -> Result<Vec<u8>> {
        self.data
            .read()
            .map(|d| d.clone())
            .map_err(|_| VfsError::storage("lock poisoned"))
    }

    async fn write(&self, data: &[u8]) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| VfsError::storage("lock poisoned"))?;
        *guard = data.to_vec();
        Ok(())
    }

    async fn size(&self) -> Result<u64> {
        self.data
            .read()
            .map(|d| d.len() as u64)
            .map_err(|_| VfsError::storage("lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_create_write_read() {
        let store = MemoryStore::new();
        let root = store.root().await.unwrap();

        let file = root.file("test.txt", true).await.unwrap();
        file.write(b"Hello").await.unwrap();
        assert_eq!(file.read().await.unwrap(), b"Hello");
        assert_eq!(file.size().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn directory_create_and_enumerate() {
        let store = MemoryStore::new();
        let root = store.root().await.unwrap();

        let dir = root.directory("mydir", true).await.unwrap();
        dir.file("file.txt", true).await.unwrap();

        let names: Vec<String> = root
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["mydir"]);
        assert_eq!(dir.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_child_without_create_is_not_found() {
        let store = MemoryStore::new();
        let root = store.root().await.unwrap();

        assert!(matches!(
            root.directory("nope", false).await.unwrap_err(),
            VfsError::NotFound { .. }
        ));
        assert!(matches!(
            root.file("nope.txt", false).await.unwrap_err(),
            VfsError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn kind_mismatch_is_typed() {
        let store = MemoryStore::with_files(vec![("/a.txt", "x")]);
        let root = store.root().await.unwrap();

        assert!(matches!(
            root.directory("a.txt", false).await.unwrap_err(),
            VfsError::NotAFolder { .. }
        ));

        root.directory("d", true).await.unwrap();
        assert!(matches!(
            root.file("d", false).await.unwrap_err(),
            VfsError::NotAFile { .. }
        ));
    }

    #[tokio::test]
    async fn live_handle_observes_external_mutation() {
        let store = MemoryStore::new();
        let root = store.root().await.unwrap();
        let dir = root.directory("shared", true).await.unwrap();

        // Mutate through a second, independently resolved handle
        let other_root = store.root().await.unwrap();
        let other = other_root.directory("shared", false).await.unwrap();
        other.file("new.txt", true).await.unwrap();

        assert_eq!(dir.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_recursive_remove_of_populated_folder_fails() {
        let store = MemoryStore::with_files(vec![("/d/inner.txt", "x")]);
        let root = store.root().await.unwrap();

        assert!(root.remove("d", false).await.is_err());
        root.remove("d", true).await.unwrap();
        assert!(root.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn estimate_tracks_usage() {
        let store = MemoryStore::with_quota(1024);
        let root = store.root().await.unwrap();
        let file = root.file("f.bin", true).await.unwrap();
        file.write(&[0u8; 100]).await.unwrap();

        let estimate = store.estimate().await.unwrap();
        assert_eq!(estimate.quota, Some(1024));
        assert_eq!(estimate.usage, Some(100));
    }

    #[tokio::test]
    async fn unavailable_store_reports_unsupported() {
        let store = MemoryStore::unavailable();
        assert!(!store.supported());
        assert!(matches!(
            store.root().await.unwrap_err(),
            VfsError::Unsupported
        ));
    }
}
