//! The seam between the client core and the native backend.
//!
//! [`Backend`] is the only thing the gateway knows about the other side of
//! the bridge. [`ChannelBackend`] is the production implementation: requests
//! travel over a tokio mpsc channel to whatever task hosts the backend and
//! each carries a oneshot sender for its reply.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Raw failure of one invocation, before normalisation by the gateway.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// The request never reached the backend, or its reply was lost.
    #[error("bridge unavailable: {0}")]
    Transport(String),

    /// The backend ran the command and rejected it. The payload is either a
    /// plain string or a structured `{code, message, details}` object.
    #[error("command rejected: {0}")]
    Rejected(Value),
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BackendError>;
}

/// A request sent *into* the backend task.
#[derive(Debug)]
pub struct BridgeRequest {
    pub command: String,
    pub args: Value,
    /// `Err` carries the backend's rejection payload.
    pub reply: oneshot::Sender<Result<Value, Value>>,
}

/// [`Backend`] over an mpsc request channel.
#[derive(Debug, Clone)]
pub struct ChannelBackend {
    tx: mpsc::Sender<BridgeRequest>,
}

impl ChannelBackend {
    pub fn new(tx: mpsc::Sender<BridgeRequest>) -> Self {
        Self { tx }
    }

    /// Create a backend together with the receiving end the host task drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<BridgeRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Backend for ChannelBackend {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BackendError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(BridgeRequest {
                command: command.to_string(),
                args,
                reply: reply_tx,
            })
            .await
            .map_err(|_| BackendError::Transport("request channel closed".into()))?;

        debug!(command, "Bridge request dispatched");

        match reply_rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(rejection)) => Err(BackendError::Rejected(rejection)),
            Err(_) => Err(BackendError::Transport("reply dropped".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_channel_backend_roundtrip() {
        let (backend, mut rx) = ChannelBackend::channel(4);

        tokio::spawn(async move {
            while let Some(req) = rx.recv().await {
                let reply = if req.command == "echo" {
                    Ok(req.args)
                } else {
                    Err(json!("unknown command"))
                };
                let _ = req.reply.send(reply);
            }
        });

        let value = backend.invoke("echo", json!({"a": 1})).await.unwrap();
        assert_eq!(value, json!({"a": 1}));

        let err = backend.invoke("nope", Value::Null).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected(Value::String(ref s)) if s == "unknown command"));
    }

    #[tokio::test]
    async fn test_channel_backend_closed() {
        let (backend, rx) = ChannelBackend::channel(1);
        drop(rx);

        let err = backend.invoke("anything", Value::Null).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[tokio::test]
    async fn test_channel_backend_reply_dropped() {
        let (backend, mut rx) = ChannelBackend::channel(1);

        tokio::spawn(async move {
            // Consume the request without answering.
            let _ = rx.recv().await;
        });

        let err = backend.invoke("anything", Value::Null).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
