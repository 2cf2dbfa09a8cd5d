//! JSON-RPC 2.0 frame shapes (§6.2): requests and responses carry an `id`;
//! notifications never do.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Reserved JSON-RPC error codes named in §6.2; anything else is a
/// server-defined custom code and is propagated verbatim.
pub mod error_code {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const SERVER_ERROR: i64 = -32000;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: u64,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcOutcome {
    Result { result: Value },
    Error { error: RpcErrorBody },
}

impl RpcResponse {
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: RpcOutcome::Result { result },
        }
    }

    pub fn err(id: u64, error: RpcErrorBody) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: RpcOutcome::Error { error },
        }
    }
}

/// Any frame the client may receive: a response to one of its own
/// requests, or a server-initiated notification (`changesCommitted`,
/// `docDeleted`, …).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundFrame {
    Response(RpcResponse),
    Notification(RpcNotification),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_round_trips_through_json() {
        let req = RpcRequest::new(1, "getDoc", json!({"id": "doc-1"}));
        let encoded = serde_json::to_vec(&req).unwrap();
        let decoded: RpcRequest = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded.method, "getDoc");
        assert_eq!(decoded.id, 1);
    }

    #[test]
    fn inbound_frame_distinguishes_response_from_notification() {
        let response = serde_json::to_vec(&RpcResponse::ok(7, json!(42))).unwrap();
        let notification = serde_json::to_vec(&RpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: "docDeleted".to_string(),
            params: json!({"docId": "d"}),
        })
        .unwrap();

        assert!(matches!(
            serde_json::from_slice::<InboundFrame>(&response).unwrap(),
            InboundFrame::Response(_)
        ));
        assert!(matches!(
            serde_json::from_slice::<InboundFrame>(&notification).unwrap(),
            InboundFrame::Notification(_)
        ));
    }
}
