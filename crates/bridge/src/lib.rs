//! The bridge between the client context and the storage host.
//!
//! The [`client::BridgeClient`] facade shapes typed requests, a
//! [`transport::BridgeTransport`] carries them across the execution-context
//! boundary, and the [`dispatcher::Dispatcher`] on the far side executes
//! them against live storage handles.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod transport;

pub use client::BridgeClient;
pub use dispatcher::Dispatcher;
pub use error::BridgeError;
pub use transport::{BridgeTransport, ChannelTransport, SocketTransport};
