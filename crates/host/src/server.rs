//! WebSocket serving loop.
//!
//! Each connection gets its own task; each text frame carries one request
//! envelope and produces exactly one response envelope. Unknown or
//! malformed operations are answered, never dropped, so a client is only
//! left waiting when the connection itself dies.

use anyhow::Result;
use futures::{SinkExt, StreamExt};
use opfs_explorer_bridge::Dispatcher;
use opfs_explorer_protocol::{BridgeRequest, BridgeResponse, ResponseEnvelope};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// Accept connections forever, dispatching each on its own task.
pub async fn run(listener: TcpListener, dispatcher: Dispatcher) -> Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        tracing::info!(%addr, "client connected");
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, dispatcher).await {
                tracing::warn!(%addr, error = %err, "connection ended with error");
            }
            tracing::info!(%addr, "client disconnected");
        });
    }
}

/// Serve one WebSocket connection until the peer closes it.
pub async fn handle_connection<S>(stream: S, dispatcher: Dispatcher) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut tx, mut rx) = ws.split();

    while let Some(frame) = rx.next().await {
        match frame? {
            Message::Text(text) => {
                let reply = handle_frame(&dispatcher, &text).await;
                tx.send(Message::Text(reply)).await?;
            }
            Message::Ping(payload) => tx.send(Message::Pong(payload)).await?,
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

/// Decode, dispatch, encode. The envelope id is echoed back even when the
/// request payload is unintelligible (id 0 when the frame has none).
async fn handle_frame(dispatcher: &Dispatcher, text: &str) -> String {
    let (id, response) = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => {
            let id = value
                .get("id")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            let response = match value.get("request") {
                Some(request) => {
                    match serde_json::from_value::<BridgeRequest>(request.clone()) {
                        Ok(request) => dispatcher.dispatch(request).await,
                        Err(err) => BridgeResponse::error(format!("unknown operation: {err}")),
                    }
                }
                None => BridgeResponse::error("missing request payload"),
            };
            (id, response)
        }
        Err(err) => (0, BridgeResponse::error(format!("malformed frame: {err}"))),
    };

    serde_json::to_string(&ResponseEnvelope { id, response }).unwrap_or_else(|_| {
        r#"{"id":0,"response":{"status":"error","error":"response encoding failed"}}"#.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use opfs_explorer_vfs::MemoryStore;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn frame_round_trip() {
        let reply = handle_frame(
            &dispatcher(),
            r#"{"id":3,"request":{"type":"check-support"}}"#,
        )
        .await;
        let envelope: ResponseEnvelope = serde_json::from_str(&reply).unwrap();
        assert_eq!(envelope.id, 3);
        assert!(matches!(envelope.response, BridgeResponse::Ok { .. }));
    }

    #[tokio::test]
    async fn unknown_operation_is_answered_with_its_id() {
        let reply = handle_frame(
            &dispatcher(),
            r#"{"id":9,"request":{"type":"defragment"}}"#,
        )
        .await;
        let envelope: ResponseEnvelope = serde_json::from_str(&reply).unwrap();
        assert_eq!(envelope.id, 9);
        let BridgeResponse::Error { error } = envelope.response else {
            panic!("expected error response");
        };
        assert!(error.contains("unknown operation"), "got: {error}");
    }

    #[tokio::test]
    async fn malformed_frame_is_answered() {
        let reply = handle_frame(&dispatcher(), "not json at all").await;
        let envelope: ResponseEnvelope = serde_json::from_str(&reply).unwrap();
        assert_eq!(envelope.id, 0);
        assert!(matches!(envelope.response, BridgeResponse::Error { .. }));
    }
}
