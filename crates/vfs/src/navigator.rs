//! Logical-path handling and handle-graph navigation.
//!
//! Paths are slash-separated; empty segments are discarded so `"a//b"`,
//! `"/a/b"` and `"a/b/"` all address the same node. Traversal segments
//! (`.` and `..`) are rejected outright rather than left to the host
//! sandbox.

use crate::error::{Result, VfsError};
use crate::handle::DirectoryHandle;

/// Split a logical path into validated segments, discarding empties.
pub fn split_segments(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for segment in &segments {
        if *segment == "." || *segment == ".." {
            return Err(VfsError::InvalidPath {
                path: path.to_string(),
                segment: (*segment).to_string(),
            });
        }
    }
    Ok(segments)
}

/// Normalize to a leading-slash form with no empty segments.
pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Append an entry name to a normalized parent path.
pub fn join(parent: &str, name: &str) -> String {
    if parent == "/" || parent.is_empty() {
        format!("/{name}")
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

/// Walk from `root` to the directory named by `path`.
///
/// Fails with not-found naming the deepest reachable prefix when a segment
/// is missing, and with not-a-folder when a segment names a file.
pub async fn resolve_directory(
    root: Box<dyn DirectoryHandle>,
    path: &str,
) -> Result<Box<dyn DirectoryHandle>> {
    let segments = split_segments(path)?;
    let mut current = root;
    let mut walked = String::new();
    for segment in segments {
        walked.push('/');
        walked.push_str(segment);
        current = current
            .directory(segment, false)
            .await
            .map_err(|e| e.with_path(&walked))?;
    }
    Ok(current)
}

/// Resolve all but the last segment as the parent directory and return it
/// together with the target name. The root itself has no target segment.
pub async fn resolve_parent_and_name(
    root: Box<dyn DirectoryHandle>,
    path: &str,
) -> Result<(Box<dyn DirectoryHandle>, String)> {
    let mut segments = split_segments(path)?;
    let Some(name) = segments.pop() else {
        return Err(VfsError::NoTarget {
            path: path.to_string(),
        });
    };
    let parent_path = if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    };
    let parent = resolve_directory(root, &parent_path).await?;
    Ok((parent, name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::SandboxStore;

    #[test]
    fn split_discards_empty_segments() {
        assert_eq!(split_segments("/a//b/").unwrap(), vec!["a", "b"]);
        assert_eq!(split_segments("/").unwrap(), Vec::<&str>::new());
        assert_eq!(split_segments("").unwrap(), Vec::<&str>::new());
    }

    #[test]
    fn split_rejects_traversal() {
        assert!(matches!(
            split_segments("/a/../b"),
            Err(VfsError::InvalidPath { segment, .. }) if segment == ".."
        ));
        assert!(split_segments("/./a").is_err());
    }

    #[test]
    fn normalize_forms() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("a/b"), "/a/b");
        assert_eq!(normalize("/a//b/"), "/a/b");
    }

    #[test]
    fn join_forms() {
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/a", "b"), "/a/b");
        assert_eq!(join("/a/", "b"), "/a/b");
    }

    #[tokio::test]
    async fn resolve_walks_nested_directories() {
        let store = MemoryStore::with_files(vec![("/a/b/c.txt", "x")]);
        let dir = resolve_directory(store.root().await.unwrap(), "/a/b")
            .await
            .unwrap();
        let entries = dir.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "c.txt");
    }

    #[tokio::test]
    async fn resolve_missing_segment_names_full_path() {
        let store = MemoryStore::new();
        let err = resolve_directory(store.root().await.unwrap(), "/a/b")
            .await
            .unwrap_err();
        assert!(matches!(err, VfsError::NotFound { ref path } if path == "/a"));
    }

    #[tokio::test]
    async fn parent_of_top_level_entry_is_root() {
        let store = MemoryStore::with_files(vec![("/a.txt", "x")]);
        let (parent, name) = resolve_parent_and_name(store.root().await.unwrap(), "/a.txt")
            .await
            .unwrap();
        assert_eq!(name, "a.txt");
        assert_eq!(parent.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn root_has_no_target_segment() {
        let store = MemoryStore::new();
        let err = resolve_parent_and_name(store.root().await.unwrap(), "/")
            .await
            .unwrap_err();
        assert!(matches!(err, VfsError::NoTarget { .. }));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_is_idempotent(path in "[a-zA-Z0-9._/ -]{0,40}") {
                prop_assume!(!path.contains(".."));
                let once = normalize(&path);
                prop_assert_eq!(normalize(&once), once);
            }

            #[test]
            fn normalized_paths_start_with_slash(path in "[a-zA-Z0-9._/ -]{0,40}") {
                prop_assert!(normalize(&path).starts_with('/'));
            }

            #[test]
            fn join_then_split_recovers_name(name in "[a-zA-Z0-9._ -]{1,20}") {
                prop_assume!(name != "." && name != "..");
                let joined = join("/some/dir", &name);
                let segments = split_segments(&joined).unwrap();
                prop_assert_eq!(segments.last().copied().unwrap(), name.as_str());
            }
        }
    }
}
