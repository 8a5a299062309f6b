//! Disk-backed sandbox store.
//!
//! Maps the handle graph onto a real directory so a native host can serve
//! the bridge. All std::fs calls run on the blocking pool. Entry names are
//! validated before touching the filesystem; combined with the navigator's
//! segment rules this keeps every operation inside the sandbox root.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Result, VfsError};
use crate::handle::{
    DirEntry, DirectoryHandle, EntryKind, FileHandle, SandboxStore, StorageEstimate,
};

/// Sandbox store rooted at a real directory.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root_path = root.into();
        let _ = fs::create_dir_all(&root_path);
        Self {
            root: root_path.canonicalize().unwrap_or(root_path),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SandboxStore for LocalStore {
    async fn root(&self) -> Result<Box<dyn DirectoryHandle>> {
        Ok(Box::new(LocalDirHandle {
            path: self.root.clone(),
        }))
    }

    async fn estimate(&self) -> Result<StorageEstimate> {
        let root = self.root.clone();
        let usage = tokio::task::spawn_blocking(move || dir_size(&root))
            .await
            .map_err(join_error)??;
        Ok(StorageEstimate {
            quota: None,
            usage: Some(usage),
        })
    }
}

fn dir_size(path: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(path).map_err(|e| io_error("", e))? {
        let entry = entry.map_err(|e| io_error("", e))?;
        let meta = entry.metadata().map_err(|e| io_error("", e))?;
        if meta.is_dir() {
            total += dir_size(&entry.path())?;
        } else {
            total += meta.len();
        }
    }
    Ok(total)
}

/// A single path component with no separators or traversal.
fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(VfsError::InvalidPath {
            path: name.to_string(),
            segment: name.to_string(),
        }),
    }
}

fn io_error(name: &str, err: io::Error) -> VfsError {
    if err.kind() == io::ErrorKind::NotFound {
        VfsError::not_found(name)
    } else {
        VfsError::storage(err.to_string())
    }
}

fn join_error(err: tokio::task::JoinError) -> VfsError {
    VfsError::storage(format!("blocking task failed: {err}"))
}

#[derive(Debug)]
struct LocalDirHandle {
    path: PathBuf,
}

impl LocalDirHandle {
    fn child(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.path.join(name))
    }
}

#[async_trait]
impl DirectoryHandle for LocalDirHandle {
    async fn entries(&self) -> Result<Vec<DirEntry>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut entries = Vec::new();
            for entry in fs::read_dir(&path).map_err(|e| io_error("", e))? {
                let entry = entry.map_err(|e| io_error("", e))?;
                let kind = if entry.file_type().map_err(|e| io_error("", e))?.is_dir() {
                    EntryKind::Folder
                } else {
                    EntryKind::File
                };
                entries.push(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    kind,
                });
            }
            Ok(entries)
        })
        .await
        .map_err(join_error)?
    }

    async fn directory(&self, name: &str, create: bool) -> Result<Box<dyn DirectoryHandle>> {
        let target = self.child(name)?;
        let owned_name = name.to_string();
        let path = tokio::task::spawn_blocking(move || match fs::metadata(&target) {
            Ok(meta) if meta.is_dir() => Ok(target),
            Ok(_) => Err(VfsError::NotAFolder { path: owned_name }),
            Err(e) if e.kind() == io::ErrorKind::NotFound && create => {
                fs::create_dir(&target).map_err(|e| io_error(&owned_name, e))?;
                Ok(target)
            }
            Err(e) => Err(io_error(&owned_name, e)),
        })
        .await
        .map_err(join_error)??;
        Ok(Box::new(LocalDirHandle { path }))
    }

    async fn file(&self, name: &str, create: bool) -> Result<Box<dyn FileHandle>> {
        let target = self.child(name)?;
        let owned_name = name.to_string();
        let path = tokio::task::spawn_blocking(move || match fs::metadata(&target) {
            Ok(meta) if meta.is_file() => Ok(target),
            Ok(_) => Err(VfsError::NotAFile { path: owned_name }),
            Err(e) if e.kind() == io::ErrorKind::NotFound && create => {
                // create without truncate: an existing file keeps its content
                fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .open(&target)
                    .map_err(|e| io_error(&owned_name, e))?;
                Ok(target)
            }
            Err(e) => Err(io_error(&owned_name, e)),
        })
        .await
        .map_err(join_error)??;
        Ok(Box::new(LocalFileHandle { path }))
    }

    async fn remove(&self, name: &str, recursive: bool) -> Result<()> {
        let target = self.child(name)?;
        let owned_name = name.to_string();
        tokio::task::spawn_blocking(move || {
            let meta = fs::metadata(&target).map_err(|e| io_error(&owned_name, e))?;
            let result = if meta.is_dir() {
                if recursive {
                    fs::remove_dir_all(&target)
                } else {
                    fs::remove_dir(&target)
                }
            } else {
                fs::remove_file(&target)
            };
            result.map_err(|e| io_error(&owned_name, e))
        })
        .await
        .map_err(join_error)?
    }
}

#[derive(Debug)]
struct LocalFileHandle {
    path: PathBuf,
}

#[async_trait]
impl FileHandle for LocalFileHandle {
    async fn read(&self) -> Result<Vec<u8>> {
        let path = self.path.clone();
        let name = file_name(&self.path);
        tokio::task::spawn_blocking(move || fs::read(&path).map_err(|e| io_error(&name, e)))
            .await
            .map_err(join_error)?
    }

    async fn write(&self, data: &[u8]) -> Result<()> {
        let path = self.path.clone();
        let name = file_name(&self.path);
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || fs::write(&path, data).map_err(|e| io_error(&name, e)))
            .await
            .map_err(join_error)?
    }

    async fn size(&self) -> Result<u64> {
        let path = self.path.clone();
        let name = file_name(&self.path);
        tokio::task::spawn_blocking(move || {
            fs::metadata(&path)
                .map(|m| m.len())
                .map_err(|e| io_error(&name, e))
        })
        .await
        .map_err(join_error)?
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
