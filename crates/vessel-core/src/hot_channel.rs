//! Hot-update channel contract.
//!
//! The wire format and transport (HTTP/WS) are out of scope; this defines
//! only the subscription contract the container/environment need, plus the
//! noop fallback used when HMR is disabled.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

/// Payload carried by an `hmr-invalidate` event.
#[derive(Debug, Clone)]
pub struct InvalidatePayload {
    pub path: String,
    pub message: Option<String>,
}

type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// `on(event, handler)`, `send(payload)`, `close()`.
#[async_trait]
pub trait HotChannel: Send + Sync {
    async fn on(&self, event: &str, handler: EventHandler);
    async fn send(&self, payload: Value);
    async fn close(&self);
}

/// Minimal in-process channel: dispatches `send`ed events to registered
/// handlers synchronously. Sufficient for driving `DevEnvironment`'s
/// `hmr-invalidate` listener without an external transport.
#[derive(Default)]
pub struct InProcessHotChannel {
    handlers: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl InProcessHotChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HotChannel for InProcessHotChannel {
    async fn on(&self, event: &str, handler: EventHandler) {
        self.handlers
            .write()
            .await
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }

    async fn send(&self, payload: Value) {
        let event = payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if let Some(handlers) = self.handlers.read().await.get(&event) {
            for handler in handlers {
                handler(payload.clone());
            }
        }
    }

    async fn close(&self) {
        self.handlers.write().await.clear();
    }
}

/// Noop fallback used when HMR is disabled: every operation silently succeeds.
#[derive(Default)]
pub struct NoopHotChannel;

#[async_trait]
impl HotChannel for NoopHotChannel {
    async fn on(&self, _event: &str, _handler: EventHandler) {}
    async fn send(&self, _payload: Value) {}
    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use serde_json::json;

    #[tokio::test]
    async fn in_process_channel_dispatches_by_event_type() {
        let channel = InProcessHotChannel::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        channel
            .on("hmr-invalidate", Arc::new(move |_payload| {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .await;

        channel
            .send(json!({"type": "hmr-invalidate", "path": "/a.js"}))
            .await;
        channel.send(json!({"type": "full-reload"})).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn noop_channel_never_panics() {
        let channel = NoopHotChannel;
        channel.send(json!({"type": "anything"})).await;
        channel.close().await;
    }
}
