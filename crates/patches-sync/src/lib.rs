//! # patches-sync
//!
//! The sync engine (§4.4): owns the one transport connection a session
//! keeps to the server, multiplexes subscriptions for every tracked
//! document over it, flushes pending changes, pulls down what's changed
//! remotely, and exposes the result as two observables — `synced` (a
//! per-document status projection) and `onError` — plus a connection
//! observable (`{online, connected, syncing}`).
//!
//! This crate consumes the contracts the rest of the workspace defines —
//! `patches-store::Store`, `patches-transport::{Transport, RpcClient}`,
//! `patches-doc::Document`, `patches-manager::Patches` — and adds no
//! persistence or wire format of its own.

mod config;
mod connection;
mod engine;
mod error;
mod events;
mod online;
mod rpc;
mod subscribe_filter;
mod synced;

pub use config::SyncConfig;
pub use connection::{ConnectionObservable, ConnectionState, SyncingState};
pub use engine::PatchesSync;
pub use error::{SyncError, SyncResult};
pub use events::{SyncErrorEvent, SyncEvent};
pub use online::{NullOnlineState, OnlineState, StaticOnlineState};
pub use rpc::{ChangesCommittedNotification, DocDeletedNotification, SyncTransport};
pub use subscribe_filter::{RootSegmentsFilter, SubscribeFilter};
