//! Test-only transport and mock server.
//!
//! [`InMemoryTransport`] is a [`Transport`] backed by an in-process
//! channel, for exercising [`crate::RpcClient`] without a real socket.
//! [`RpcResponder`] is a minimal per-method mock server: register a
//! handler per method name, feed it request frames, get response frames
//! back. Neither ships a real server implementation — the server is
//! explicitly out of scope — they only let tests drive the client side
//! convincingly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::client::Transport;
use crate::error::{TransportError, TransportResult};
use crate::wire::{RpcErrorBody, RpcRequest, RpcResponse, error_code};

/// One side of an in-process duplex channel. `send` pushes onto the
/// `outbound` queue; tests drain it, synthesize a response (directly or
/// via [`RpcResponder`]), and feed it back with `RpcClient::handle_incoming`.
pub struct InMemoryTransport {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
}

impl InMemoryTransport {
    /// Builds a transport plus the receiver end of its outbound queue.
    pub fn pair() -> (Arc<InMemoryTransport>, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(InMemoryTransport { outbound: tx }), rx)
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, frame: Vec<u8>) -> TransportResult<()> {
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::ConnectionLost)
    }
}

type Handler = Box<dyn Fn(Value) -> Result<Value, RpcErrorBody> + Send + Sync>;

/// A minimal per-method mock server for test harnesses.
#[derive(Default)]
pub struct RpcResponder {
    handlers: HashMap<String, Handler>,
}

impl RpcResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method`. Later calls with the same method
    /// name replace the previous handler.
    pub fn on(
        &mut self,
        method: impl Into<String>,
        handler: impl Fn(Value) -> Result<Value, RpcErrorBody> + Send + Sync + 'static,
    ) -> &mut Self {
        self.handlers.insert(method.into(), Box::new(handler));
        self
    }

    /// Parses `frame` as a request and returns the encoded response frame.
    pub fn respond(&self, frame: &[u8]) -> Vec<u8> {
        let request: RpcRequest = match serde_json::from_slice(frame) {
            Ok(request) => request,
            Err(source) => {
                return encode(&RpcResponse::err(
                    0,
                    RpcErrorBody {
                        code: error_code::PARSE_ERROR,
                        message: source.to_string(),
                        data: None,
                    },
                ));
            }
        };
        let response = match self.handlers.get(&request.method) {
            Some(handler) => match handler(request.params) {
                Ok(result) => RpcResponse::ok(request.id, result),
                Err(error) => RpcResponse::err(request.id, error),
            },
            None => RpcResponse::err(
                request.id,
                RpcErrorBody {
                    code: error_code::METHOD_NOT_FOUND,
                    message: format!("method not found: {}", request.method),
                    data: None,
                },
            ),
        };
        encode(&response)
    }
}

fn encode(response: &RpcResponse) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RpcClient;
    use serde_json::json;

    #[tokio::test]
    async fn responder_echoes_registered_handler_result() {
        let (transport, mut outbound) = InMemoryTransport::pair();
        let client = Arc::new(RpcClient::new(transport));
        let mut responder = RpcResponder::new();
        responder.on("getDoc", |_params| Ok(json!({"rev": 3})));

        let client_clone = client.clone();
        let call = tokio::spawn(async move { client_clone.call("getDoc", json!({})).await });

        let sent = outbound.recv().await.unwrap();
        let response = responder.respond(&sent);
        client.handle_incoming(&response);

        assert_eq!(call.await.unwrap().unwrap(), json!({"rev": 3}));
    }

    #[tokio::test]
    async fn responder_returns_method_not_found_for_unregistered_method() {
        let (transport, mut outbound) = InMemoryTransport::pair();
        let client = Arc::new(RpcClient::new(transport));
        let responder = RpcResponder::new();

        let client_clone = client.clone();
        let call = tokio::spawn(async move { client_clone.call("unknownMethod", json!({})).await });

        let sent = outbound.recv().await.unwrap();
        let response = responder.respond(&sent);
        client.handle_incoming(&response);

        assert!(matches!(
            call.await.unwrap(),
            Err(TransportError::MethodNotFound(_))
        ));
    }
}
