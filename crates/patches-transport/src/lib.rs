//! # patches-transport
//!
//! The JSON-RPC 2.0 client framing (§4.5/§6.2) and the batching policy
//! (§4.6) the sync engine flushes changes through. This crate draws no
//! distinction between "a WebSocket" and "an in-process test channel" —
//! both are just a [`Transport`]; see [`InMemoryTransport`] and
//! [`RpcResponder`] for the latter.

mod batching;
mod client;
mod error;
mod memory_transport;
mod wire;

pub use batching::break_into_batches;
pub use client::{RpcClient, Transport};
pub use error::{TransportError, TransportResult};
pub use memory_transport::{InMemoryTransport, RpcResponder};
pub use wire::{
    InboundFrame, JSONRPC_VERSION, RpcErrorBody, RpcNotification, RpcOutcome, RpcRequest,
    RpcResponse, error_code,
};
