use thiserror::Error;

/// Typed failures surfaced by storage operations.
#[derive(Debug, Error)]
pub enum VfsError {
    #[error("sandboxed storage is not available in this environment")]
    Unsupported,

    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("invalid path segment {segment:?} in {path:?}")]
    InvalidPath { path: String, segment: String },

    #[error("path has no target segment: {path:?}")]
    NoTarget { path: String },

    #[error("not a file: {path}")]
    NotAFile { path: String },

    #[error("not a folder: {path}")]
    NotAFolder { path: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl VfsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Replace the path a handle reported (usually a bare entry name) with
    /// the full logical path known to the caller.
    pub fn with_path(self, path: &str) -> Self {
        match self {
            Self::NotFound { .. } => Self::NotFound { path: path.into() },
            Self::NotAFile { .. } => Self::NotAFile { path: path.into() },
            Self::NotAFolder { .. } => Self::NotAFolder { path: path.into() },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, VfsError>;
