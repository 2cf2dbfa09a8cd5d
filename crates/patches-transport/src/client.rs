//! [`RpcClient`]: the JSON-RPC 2.0 client half of §4.5/§6.2.
//!
//! A client owns no socket itself — it hands encoded frames to a
//! [`Transport`] and expects the caller to feed bytes the transport
//! receives back into [`RpcClient::handle_incoming`]. This keeps the wire
//! codec split from whatever carries its bytes (TCP, in-process channel, …).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};

use crate::error::{TransportError, TransportResult};
use crate::wire::{InboundFrame, RpcOutcome, RpcRequest};

/// The byte-string duplex channel a client sends frames over. Receiving is
/// push-based: whatever drives the concrete transport (a WebSocket read
/// loop, an in-memory test harness, …) calls [`RpcClient::handle_incoming`]
/// as frames arrive.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, frame: Vec<u8>) -> TransportResult<()>;
}

type PendingMap = Mutex<HashMap<u64, oneshot::Sender<Result<Value, TransportError>>>>;

pub struct RpcClient<T: Transport + ?Sized> {
    transport: Arc<T>,
    next_id: AtomicU64,
    pending: PendingMap,
    notifications: Mutex<HashMap<String, broadcast::Sender<Value>>>,
}

impl<T: Transport + ?Sized> RpcClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
            notifications: Mutex::new(HashMap::new()),
        }
    }

    /// Number of requests still awaiting a response. Exposed for tests
    /// exercising the parse-error recovery policy (P7).
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Sends a request and awaits its response.
    pub async fn call(&self, method: &str, params: Value) -> TransportResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let request = RpcRequest::new(id, method, params);
        let encoded =
            serde_json::to_vec(&request).map_err(|source| TransportError::Send(source.to_string()))?;

        if let Err(error) = self.transport.send(encoded).await {
            self.pending.lock().remove(&id);
            return Err(error);
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(TransportError::ConnectionLost),
        }
    }

    /// Subscribes to server-initiated notifications for `method` (e.g.
    /// `"changesCommitted"`, `"docDeleted"`).
    pub fn subscribe(&self, method: &str) -> broadcast::Receiver<Value> {
        let mut notifications = self.notifications.lock();
        notifications
            .entry(method.to_string())
            .or_insert_with(|| broadcast::channel(256).0)
            .subscribe()
    }

    /// Feeds one frame the transport received into the client.
    ///
    /// On an unparseable frame, rejects every currently pending request
    /// with [`TransportError::ParseError`] and clears the pending map —
    /// the recovery policy named in §4.5/P7. Requests issued afterwards
    /// proceed normally.
    pub fn handle_incoming(&self, frame: &[u8]) {
        match serde_json::from_slice::<InboundFrame>(frame) {
            Ok(InboundFrame::Response(response)) => {
                let sender = self.pending.lock().remove(&response.id);
                match sender {
                    Some(sender) => {
                        let result = match response.outcome {
                            RpcOutcome::Result { result } => Ok(result),
                            RpcOutcome::Error { error } => {
                                Err(TransportError::from_rpc_error(error))
                            }
                        };
                        let _ = sender.send(result);
                    }
                    None => {
                        tracing::warn!(id = response.id, "dropping response for unknown request id");
                    }
                }
            }
            Ok(InboundFrame::Notification(notification)) => {
                let notifications = self.notifications.lock();
                if let Some(sender) = notifications.get(&notification.method) {
                    let _ = sender.send(notification.params);
                }
            }
            Err(source) => {
                tracing::warn!(error = %source, "unparseable frame; rejecting all pending requests");
                self.reject_all_pending(TransportError::parse_error(frame, source.to_string()));
            }
        }
    }

    fn reject_all_pending(&self, error: TransportError) {
        let mut pending = self.pending.lock();
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(error.clone()));
        }
    }

    /// Rejects every request still pending with [`TransportError::ConnectionLost`].
    /// Called when the underlying connection drops.
    pub fn reject_pending_on_disconnect(&self) {
        self.reject_all_pending(TransportError::ConnectionLost);
    }

    /// Stops accepting new work conceptually (callers should stop invoking
    /// [`RpcClient::call`] after this), lets in-flight requests settle for
    /// `grace`, then rejects whatever remains with [`TransportError::Cancelled`].
    pub async fn shutdown(&self, grace: Duration) {
        tokio::time::sleep(grace).await;
        self.reject_all_pending(TransportError::Cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingTransport {
        sent: StdMutex<Vec<Vec<u8>>>,
        notify: Notify,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, frame: Vec<u8>) -> TransportResult<()> {
            self.sent.lock().unwrap().push(frame);
            self.notify.notify_one();
            Ok(())
        }
    }

    #[tokio::test]
    async fn call_resolves_on_matching_response() {
        let transport = Arc::new(RecordingTransport::default());
        let client = Arc::new(RpcClient::new(transport.clone()));

        let client_clone = client.clone();
        let handle = tokio::spawn(async move { client_clone.call("getDoc", serde_json::json!({})).await });

        transport.notify.notified().await;
        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        let request: RpcRequest = serde_json::from_slice(&sent[0]).unwrap();

        let response = serde_json::to_vec(&crate::wire::RpcResponse::ok(
            request.id,
            serde_json::json!({"rev": 1}),
        ))
        .unwrap();
        client.handle_incoming(&response);

        let result = handle.await.unwrap().unwrap();
        assert_eq!(result, serde_json::json!({"rev": 1}));
    }

    #[tokio::test]
    async fn unparseable_frame_rejects_all_pending_and_future_calls_still_work() {
        let transport = Arc::new(RecordingTransport::default());
        let client = Arc::new(RpcClient::new(transport.clone()));

        let a = client.clone();
        let b = client.clone();
        let call_a = tokio::spawn(async move { a.call("getDoc", serde_json::json!({})).await });
        let call_b = tokio::spawn(async move { b.call("getDoc", serde_json::json!({})).await });

        // Give both calls a chance to register as pending.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(client.pending_count(), 2);

        client.handle_incoming(b"502 Bad Gateway");

        assert!(matches!(
            call_a.await.unwrap(),
            Err(TransportError::ParseError { .. })
        ));
        assert!(matches!(
            call_b.await.unwrap(),
            Err(TransportError::ParseError { .. })
        ));
        assert_eq!(client.pending_count(), 0);

        let c = client.clone();
        let call_c = tokio::spawn(async move { c.call("getDoc", serde_json::json!({})).await });
        tokio::task::yield_now().await;
        let sent = transport.sent.lock().unwrap().clone();
        let last_request: RpcRequest = serde_json::from_slice(sent.last().unwrap()).unwrap();
        let response =
            serde_json::to_vec(&crate::wire::RpcResponse::ok(last_request.id, serde_json::json!(null)))
                .unwrap();
        client.handle_incoming(&response);
        assert!(call_c.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn unknown_response_id_is_dropped_without_panicking() {
        let transport = Arc::new(RecordingTransport::default());
        let client = RpcClient::new(transport);
        let response = serde_json::to_vec(&crate::wire::RpcResponse::ok(999, serde_json::json!(1))).unwrap();
        client.handle_incoming(&response);
    }
}
