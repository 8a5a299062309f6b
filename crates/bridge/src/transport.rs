//! Request/response channels across the execution-context boundary.
//!
//! Two transports are provided: [`ChannelTransport`] for contexts sharing
//! a process, and [`SocketTransport`] for a dispatcher living behind a
//! WebSocket host. Neither retries nor times out; a request whose response
//! never arrives resolves only when the connection itself goes away.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use opfs_explorer_protocol::{BridgeRequest, BridgeResponse, RequestEnvelope, ResponseEnvelope};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::tungstenite::Message;

use crate::dispatcher::Dispatcher;
use crate::error::BridgeError;

/// Carries typed operation requests to wherever the live handles are.
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Send one request and wait for its response. Concurrent sends are
    /// independent; no mutual ordering is guaranteed.
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError>;
}

/// One queued request paired with its reply channel.
pub type RequestSlot = (BridgeRequest, oneshot::Sender<BridgeResponse>);

/// Same-process transport: requests flow over an mpsc queue to a
/// dispatcher task, each paired with its own oneshot reply channel.
pub struct ChannelTransport {
    tx: mpsc::Sender<RequestSlot>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<RequestSlot>) -> Self {
        Self { tx }
    }

    /// Spawn a serving task for `dispatcher` and return the transport
    /// feeding it. Each request is dispatched in its own task.
    pub fn spawn(dispatcher: Dispatcher) -> Self {
        let (tx, mut rx) = mpsc::channel::<RequestSlot>(32);
        tokio::spawn(async move {
            while let Some((request, reply)) = rx.recv().await {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    let _ = reply.send(dispatcher.dispatch(request).await);
                });
            }
        });
        Self { tx }
    }
}

#[async_trait]
impl BridgeTransport for ChannelTransport {
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| BridgeError::Unreachable("dispatcher is gone".into()))?;
        reply_rx
            .await
            .map_err(|_| BridgeError::Unreachable("dispatcher dropped the request".into()))
    }
}

/// Pending socket requests awaiting their response frame.
///
/// When a request is sent, a oneshot channel is registered under the
/// envelope id; the reader task resolves it when the matching response
/// arrives. Dropping the registry's entries fails the waiters.
#[derive(Default)]
struct PendingRegistry {
    pending: Mutex<HashMap<u64, oneshot::Sender<BridgeResponse>>>,
}

impl PendingRegistry {
    async fn register(&self, id: u64) -> oneshot::Receiver<BridgeResponse> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);
        rx
    }

    async fn resolve(&self, id: u64, response: BridgeResponse) {
        let tx = self.pending.lock().await.remove(&id);
        if let Some(tx) = tx {
            let _ = tx.send(response);
        } else {
            tracing::warn!(id, "response frame with no pending request");
        }
    }

    async fn cancel(&self, id: u64) {
        self.pending.lock().await.remove(&id);
    }

    async fn abort_all(&self) {
        self.pending.lock().await.clear();
    }
}

/// WebSocket transport: connects to a bridge host and correlates frames
/// by envelope id.
pub struct SocketTransport {
    tx: mpsc::UnboundedSender<Message>,
    registry: Arc<PendingRegistry>,
    next_id: AtomicU64,
}

impl SocketTransport {
    /// Connect to a bridge host, e.g. `ws://127.0.0.1:9220`.
    pub async fn connect(url: &str) -> Result<Self, BridgeError> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| BridgeError::Unreachable(e.to_string()))?;
        let (mut sink, mut stream) = ws.split();

        let (tx, mut outgoing) = mpsc::unbounded_channel::<Message>();
        tokio::spawn(async move {
            while let Some(frame) = outgoing.recv().await {
                if sink.send(frame).await.is_err() {
                    break;
                }
            }
        });

        let registry = Arc::new(PendingRegistry::default());
        let reader_registry = registry.clone();
        tokio::spawn(async move {
            while let Some(Ok(frame)) = stream.next().await {
                if let Message::Text(text) = frame {
                    match serde_json::from_str::<ResponseEnvelope>(&text) {
                        Ok(envelope) => {
                            reader_registry.resolve(envelope.id, envelope.response).await;
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "discarding unparseable bridge frame");
                        }
                    }
                }
            }
            reader_registry.abort_all().await;
        });

        Ok(Self {
            tx,
            registry,
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl BridgeTransport for SocketTransport {
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let rx = self.registry.register(id).await;

        let frame = serde_json::to_string(&RequestEnvelope { id, request })
            .map_err(|e| BridgeError::Protocol(e.to_string()))?;
        if self.tx.send(Message::Text(frame)).is_err() {
            self.registry.cancel(id).await;
            return Err(BridgeError::Unreachable("socket writer is gone".into()));
        }

        rx.await
            .map_err(|_| BridgeError::Unreachable("connection closed before response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opfs_explorer_protocol::ResponseBody;
    use opfs_explorer_vfs::MemoryStore;

    #[tokio::test]
    async fn channel_transport_round_trips() {
        let transport =
            ChannelTransport::spawn(Dispatcher::new(Arc::new(MemoryStore::new())));
        let response = transport.send(BridgeRequest::CheckSupport).await.unwrap();
        assert_eq!(
            response,
            BridgeResponse::ok(ResponseBody::CheckSupport { supported: true })
        );
    }

    #[tokio::test]
    async fn closed_channel_is_unreachable() {
        let (tx, rx) = mpsc::channel::<RequestSlot>(1);
        drop(rx);
        let transport = ChannelTransport::new(tx);
        let err = transport
            .send(BridgeRequest::CheckSupport)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Unreachable(_)));
    }

    #[tokio::test]
    async fn concurrent_requests_resolve_independently() {
        let store = MemoryStore::with_files(vec![("/a.txt", "A"), ("/b.txt", "B")]);
        let transport = Arc::new(ChannelTransport::spawn(Dispatcher::new(Arc::new(store))));

        let t1 = transport.clone();
        let t2 = transport.clone();
        let (r1, r2) = tokio::join!(
            t1.send(BridgeRequest::ReadFile {
                file_path: "/a.txt".into()
            }),
            t2.send(BridgeRequest::ReadFile {
                file_path: "/b.txt".into()
            }),
        );
        assert_eq!(
            r1.unwrap(),
            BridgeResponse::ok(ResponseBody::ReadFile { content: "A".into() })
        );
        assert_eq!(
            r2.unwrap(),
            BridgeResponse::ok(ResponseBody::ReadFile { content: "B".into() })
        );
    }
}
