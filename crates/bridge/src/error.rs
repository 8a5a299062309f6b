use thiserror::Error;

/// Failures surfaced to callers of the client facade.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge not initialized: call initialize() first")]
    Uninitialized,

    #[error("sandboxed storage is not supported by the host environment")]
    Unsupported,

    /// The destination context cannot be reached at all.
    #[error("bridge transport unreachable: {0}")]
    Unreachable(String),

    /// The host reached the storage primitive and it rejected the call.
    #[error("{0}")]
    Operation(String),

    /// The peer answered with something outside the protocol.
    #[error("protocol violation: {0}")]
    Protocol(String),
}
