//! Recursive aggregation of file/folder counts and byte totals.

use opfs_explorer_protocol::DirectoryStats;

use crate::error::Result;
use crate::handle::{DirectoryHandle, EntryKind};
use crate::navigator::{join, normalize};

/// Walk the subtree under `dir` accumulating counts and total size.
///
/// Failure to enumerate `dir` itself propagates with the offending path;
/// deeper failures are logged and skipped. A file whose size cannot be
/// read still counts toward `file_count` but contributes nothing to
/// `total_size`.
pub async fn compute_stats(dir: &dyn DirectoryHandle, path: &str) -> Result<DirectoryStats> {
    let normalized = normalize(path);
    let entries = dir.entries().await.map_err(|e| e.with_path(&normalized))?;
    let mut stats = DirectoryStats {
        path: normalized.clone(),
        ..DirectoryStats::default()
    };
    tally(dir, &normalized, entries, &mut stats).await;
    Ok(stats)
}

async fn tally(
    dir: &dyn DirectoryHandle,
    path: &str,
    entries: Vec<crate::handle::DirEntry>,
    stats: &mut DirectoryStats,
) {
    for entry in entries {
        let child_path = join(path, &entry.name);
        match entry.kind {
            EntryKind::File => {
                stats.file_count += 1;
                match file_size(dir, &entry.name).await {
                    Ok(size) => stats.total_size += size,
                    Err(err) => {
                        tracing::warn!(path = %child_path, error = %err, "file size unreadable, excluded from total");
                    }
                }
            }
            EntryKind::Folder => {
                stats.folder_count += 1;
                match dir.directory(&entry.name, false).await {
                    Ok(child) => match child.entries().await {
                        Ok(child_entries) => {
                            Box::pin(tally(child.as_ref(), &child_path, child_entries, stats))
                                .await;
                        }
                        Err(err) => {
                            tracing::warn!(path = %child_path, error = %err, "subdirectory enumeration failed, skipped");
                        }
                    },
                    Err(err) => {
                        tracing::warn!(path = %child_path, error = %err, "subdirectory unreachable, skipped");
                    }
                }
            }
        }
    }
}

async fn file_size(dir: &dyn DirectoryHandle, name: &str) -> Result<u64> {
    dir.file(name, false).await?.size().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::SandboxStore;

    #[tokio::test]
    async fn empty_directory_has_zero_stats() {
        let store = MemoryStore::new();
        let root = store.root().await.unwrap();
        let stats = compute_stats(root.as_ref(), "/").await.unwrap();
        assert_eq!(stats.file_count, 0);
        assert_eq!(stats.folder_count, 0);
        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.path, "/");
    }

    #[tokio::test]
    async fn counts_and_sizes_accumulate_recursively() {
        let store = MemoryStore::with_files(vec![
            ("/a.txt", "12345"),
            ("/d/b.txt", "123"),
            ("/d/e/c.txt", "12"),
        ]);
        let root = store.root().await.unwrap();
        let stats = compute_stats(root.as_ref(), "/").await.unwrap();

        assert_eq!(stats.file_count, 3);
        assert_eq!(stats.folder_count, 2);
        assert_eq!(stats.total_size, 10);
    }

    #[tokio::test]
    async fn entry_total_matches_full_enumeration() {
        let store = MemoryStore::with_files(vec![
            ("/x/one.txt", "1"),
            ("/x/two.txt", "2"),
            ("/x/y/three.txt", "3"),
        ]);
        let root = store.root().await.unwrap();
        let stats = compute_stats(root.as_ref(), "/").await.unwrap();

        // 3 files + 2 folders = every entry reachable from root
        assert_eq!(stats.file_count + stats.folder_count, 5);
    }

    #[tokio::test]
    async fn stats_of_subdirectory_name_its_path() {
        let store = MemoryStore::with_files(vec![("/sub/f.txt", "abc")]);
        let root = store.root().await.unwrap();
        let dir = crate::navigator::resolve_directory(root, "/sub").await.unwrap();
        let stats = compute_stats(dir.as_ref(), "/sub").await.unwrap();

        assert_eq!(stats.path, "/sub");
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.total_size, 3);
    }
}
