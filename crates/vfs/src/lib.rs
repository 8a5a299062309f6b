pub mod error;
pub mod handle;
pub mod local;
pub mod memory;
pub mod navigator;
pub mod stats;
pub mod tree;

pub use error::{Result, VfsError};
pub use handle::{DirEntry, DirectoryHandle, EntryKind, FileHandle, SandboxStore, StorageEstimate};
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use navigator::{join, normalize, resolve_directory, resolve_parent_and_name, split_segments};
pub use stats::compute_stats;
pub use tree::build_tree;
