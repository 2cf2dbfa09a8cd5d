//! Error taxonomy for the transport layer (§7: transport/parse and
//! protocol errors).

use serde_json::Value;
use thiserror::Error;

use crate::wire::{RpcErrorBody, error_code};

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Error, Clone)]
pub enum TransportError {
    /// An unparseable frame was received. The raw frame is kept, truncated
    /// to 200 bytes, alongside the underlying parse failure's message.
    #[error("parse error on frame {raw:?}: {message}")]
    ParseError { message: String, raw: String },

    /// The underlying connection was lost while a request was in flight.
    #[error("connection lost")]
    ConnectionLost,

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// A server error outside the reserved JSON-RPC codes, or the generic
    /// `-32000` bucket; propagated verbatim.
    #[error("server error {code}: {message}")]
    Server {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// The client shut down and rejected this request after its grace
    /// period elapsed.
    #[error("request cancelled")]
    Cancelled,

    #[error("transport send failed: {0}")]
    Send(String),
}

impl TransportError {
    /// Truncates `raw` to 200 bytes (on a UTF-8 boundary) as §7 requires.
    pub fn parse_error(raw: &[u8], message: impl Into<String>) -> Self {
        let limit = raw.len().min(200);
        let mut end = limit;
        while end > 0 && std::str::from_utf8(&raw[..end]).is_err() {
            end -= 1;
        }
        TransportError::ParseError {
            message: message.into(),
            raw: String::from_utf8_lossy(&raw[..end]).into_owned(),
        }
    }

    pub fn from_rpc_error(error: RpcErrorBody) -> Self {
        match error.code {
            error_code::METHOD_NOT_FOUND => TransportError::MethodNotFound(error.message),
            error_code::INVALID_PARAMS => TransportError::InvalidParams(error.message),
            _ => TransportError::Server {
                code: error.code,
                message: error.message,
                data: error.data,
            },
        }
    }
}
