//! Events broadcast by the sync engine: `onSyncedChange`, `onError`, and
//! connection-observable transitions.

use std::collections::HashMap;
use std::sync::Arc;

use patches_types::{DocId, SyncedEntry};

use crate::connection::ConnectionObservable;

#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A fresh snapshot of the `synced` map, emitted whenever it actually
    /// changes (§4.4.5).
    SyncedChange(Arc<HashMap<DocId, SyncedEntry>>),
    /// `onError` (§7): `cause` is rendered via `Display` rather than kept
    /// as a live error value so this event stays cheaply `Clone`.
    Error(SyncErrorEvent),
    ConnectionChange(ConnectionObservable),
}

#[derive(Debug, Clone)]
pub struct SyncErrorEvent {
    pub doc_id: Option<DocId>,
    pub message: String,
}
