//! Tree materialization over a directory handle.

use std::cmp::Ordering;

use opfs_explorer_protocol::FileTreeNode;

use crate::error::Result;
use crate::handle::{DirectoryHandle, EntryKind};
use crate::navigator::join;

/// Recursively materialize the subtree under `dir` into an ordered,
/// serializable snapshot. `path` is the logical path of `dir` itself.
///
/// A subdirectory that cannot be entered or enumerated degrades to an
/// empty `children` list; only failure to enumerate `dir` itself
/// propagates. A partial tree beats no tree.
pub async fn build_tree(dir: &dyn DirectoryHandle, path: &str) -> Result<Vec<FileTreeNode>> {
    let entries = dir.entries().await?;
    let mut nodes = Vec::with_capacity(entries.len());

    for entry in entries {
        let child_path = join(path, &entry.name);
        match entry.kind {
            EntryKind::File => nodes.push(FileTreeNode::file(child_path, entry.name)),
            EntryKind::Folder => {
                // Box::pin required for async recursion
                let children = match dir.directory(&entry.name, false).await {
                    Ok(child) => match Box::pin(build_tree(child.as_ref(), &child_path)).await {
                        Ok(children) => children,
                        Err(err) => {
                            tracing::warn!(path = %child_path, error = %err, "subtree enumeration failed, returning partial tree");
                            Vec::new()
                        }
                    },
                    Err(err) => {
                        tracing::warn!(path = %child_path, error = %err, "subdirectory unreachable, returning partial tree");
                        Vec::new()
                    }
                };
                nodes.push(FileTreeNode::folder(child_path, entry.name, children));
            }
        }
    }

    sort_siblings(&mut nodes);
    Ok(nodes)
}

/// Sort one level: folders before files, then case-insensitive by name.
fn sort_siblings(nodes: &mut [FileTreeNode]) {
    nodes.sort_by(|a, b| match (a.kind.is_folder(), b.kind.is_folder()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::SandboxStore;
    use opfs_explorer_protocol::NodeKind;

    #[tokio::test]
    async fn empty_directory_yields_empty_tree() {
        let store = MemoryStore::new();
        let root = store.root().await.unwrap();
        assert!(build_tree(root.as_ref(), "/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn folders_sort_before_files_case_insensitively() {
        let store = MemoryStore::with_files(vec![("/z", "z"), ("/a", "a")]);
        {
            let root = store.root().await.unwrap();
            root.directory("b", true).await.unwrap();
            root.directory("A", true).await.unwrap();
        }

        let root = store.root().await.unwrap();
        let tree = build_tree(root.as_ref(), "/").await.unwrap();
        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["A", "b", "a", "z"]);
    }

    #[tokio::test]
    async fn nested_tree_ids_match_paths() {
        let store = MemoryStore::with_files(vec![("/docs/guide/intro.md", "x"), ("/readme.md", "y")]);
        let root = store.root().await.unwrap();
        let tree = build_tree(root.as_ref(), "/").await.unwrap();

        assert_eq!(tree[0].path, "/docs");
        assert_eq!(tree[0].kind, NodeKind::Folder);
        let guide = &tree[0].children.as_ref().unwrap()[0];
        assert_eq!(guide.path, "/docs/guide");
        let intro = &guide.children.as_ref().unwrap()[0];
        assert_eq!(intro.id, "/docs/guide/intro.md");
        assert_eq!(intro.id, intro.path);
        assert_eq!(intro.kind, NodeKind::File);
    }

    #[tokio::test]
    async fn folder_children_present_even_when_empty() {
        let store = MemoryStore::new();
        store
            .root()
            .await
            .unwrap()
            .directory("empty", true)
            .await
            .unwrap();

        let root = store.root().await.unwrap();
        let tree = build_tree(root.as_ref(), "/").await.unwrap();
        assert_eq!(tree[0].children, Some(Vec::new()));
    }

    #[tokio::test]
    async fn tree_matches_fresh_enumeration() {
        let store = MemoryStore::with_files(vec![("/a/x.txt", "1"), ("/a/y.txt", "2"), ("/b.txt", "3")]);
        let root = store.root().await.unwrap();
        let tree = build_tree(root.as_ref(), "/").await.unwrap();

        let mut tree_names: Vec<String> = tree.iter().map(|n| n.name.clone()).collect();
        tree_names.sort();
        let fresh = store.root().await.unwrap();
        let mut listed: Vec<String> = fresh
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        listed.sort();
        assert_eq!(tree_names, listed);
    }
}
