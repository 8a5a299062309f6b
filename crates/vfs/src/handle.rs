//! Opaque handles into the sandboxed storage graph.
//!
//! A handle is scoped to a single operation: callers obtain a fresh root
//! from the store, walk down from it, and let every handle drop when the
//! operation completes. Nothing here is cached, so no handle can outlive
//! an external mutation unnoticed.

use async_trait::async_trait;

use crate::error::Result;

/// Classification of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// One child of a directory, as reported by enumeration.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// A live reference to a file object.
#[async_trait]
pub trait FileHandle: Send + Sync + std::fmt::Debug {
    /// Read the entire contents.
    async fn read(&self) -> Result<Vec<u8>>;

    /// Replace the entire contents.
    async fn write(&self, data: &[u8]) -> Result<()>;

    /// Current byte length.
    async fn size(&self) -> Result<u64>;
}

/// A live reference to a directory object.
///
/// Errors carry the bare entry name; callers that know the full logical
/// path rewrite it via [`crate::VfsError::with_path`].
#[async_trait]
pub trait DirectoryHandle: Send + Sync + std::fmt::Debug {
    /// Enumerate direct children. Order is host-defined, not sorted.
    async fn entries(&self) -> Result<Vec<DirEntry>>;

    /// Obtain a child directory handle, optionally creating the directory.
    async fn directory(&self, name: &str, create: bool) -> Result<Box<dyn DirectoryHandle>>;

    /// Obtain a child file handle, optionally creating an empty file.
    async fn file(&self, name: &str, create: bool) -> Result<Box<dyn FileHandle>>;

    /// Remove a child entry. Non-empty directories require `recursive`.
    async fn remove(&self, name: &str, recursive: bool) -> Result<()>;
}

/// Quota/usage numbers reported by the host storage subsystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageEstimate {
    pub quota: Option<u64>,
    pub usage: Option<u64>,
}

/// The storage graph owner. Hands out a fresh root handle per operation.
#[async_trait]
pub trait SandboxStore: Send + Sync {
    /// Whether this environment offers sandboxed storage at all.
    fn supported(&self) -> bool {
        true
    }

    /// A fresh root directory handle. Obtain one per operation; never
    /// store the result.
    async fn root(&self) -> Result<Box<dyn DirectoryHandle>>;

    /// Point-in-time quota/usage estimate.
    async fn estimate(&self) -> Result<StorageEstimate>;
}
