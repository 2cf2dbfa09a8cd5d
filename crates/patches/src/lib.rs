//! # patches
//!
//! A client-side collaborative document synchronization core: local-first
//! document replicas backed by an operational-transform or
//! last-writer-wins conflict resolution strategy, persisted through a
//! pluggable [`Store`], and kept in sync with a server through a pluggable
//! [`Transport`] by [`PatchesSync`].
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use patches::{Patches, PatchesSync, MemoryStore, SyncTransport, RpcClient, NullOnlineState, SyncConfig};
//!
//! let store = Arc::new(MemoryStore::new());
//! let manager = Arc::new(Patches::new(store.clone()));
//!
//! let client = Arc::new(RpcClient::new(my_transport));
//! let transport = Arc::new(SyncTransport::new(client));
//! let online = Arc::new(NullOnlineState::new());
//!
//! let sync = PatchesSync::new(manager.clone(), store, transport, online, SyncConfig::default());
//! ```
//!
//! This crate does **not** provide a one-call "default stack" constructor:
//! callers choose and build their own [`Store`], [`Transport`], and
//! [`OnlineState`] implementations and wire them together.
//! [`patches_config`] supplies the settings values; turning them into a
//! running stack is the embedder's job.
//!
//! # Modules
//!
//! - Data model (§3): [`Operation`], [`Change`], [`Snapshot`], [`DocId`],
//!   [`Rev`], [`TrackedDoc`], [`SyncedEntry`]
//! - Conflict resolution (§4.1): [`Strategy`], [`OtStrategy`], [`LwwStrategy`]
//! - Persistence (§6.1): [`Store`], [`MemoryStore`]
//! - Wire protocol (§4.5/§6.2): [`Transport`], [`RpcClient`]
//! - Replica (§4.2): [`Document`]
//! - Doc manager (§4.3): [`Patches`]
//! - Sync engine (§4.4): [`PatchesSync`]
//! - Configuration: [`patches_config::PatchesConfig`]

pub use patches_types::{
    AlgorithmKind, BatchId, Change, ChangeId, Clock, DocId, FixedClock, Operation, Path,
    PathSegment, Rev, Snapshot, SystemClock, SyncStatus, SyncedEntry, TrackedDoc, tag,
};

pub use patches_algorithm::{
    AlgorithmError, AlgorithmResult, LwwStrategy, OtStrategy, Strategy, strategy_for,
};

pub use patches_store::{MemoryStore, Store, StoreError, StoreResult};

pub use patches_transport::{
    InMemoryTransport, RpcClient, RpcResponder, Transport, TransportError, TransportResult,
    break_into_batches,
};

pub use patches_doc::{Document, DocError, DocMutation, DocResult, MutationKind};

pub use patches_manager::{ManagerError, ManagerEvent, ManagerResult, Patches};

pub use patches_sync::{
    ChangesCommittedNotification, ConnectionObservable, ConnectionState, DocDeletedNotification,
    NullOnlineState, OnlineState, PatchesSync, RootSegmentsFilter, StaticOnlineState,
    SubscribeFilter, SyncConfig, SyncError, SyncErrorEvent, SyncEvent, SyncResult, SyncTransport,
    SyncingState,
};

pub use patches_config::{ConfigError, ConfigLoader, PatchesConfig};

/// Turns loaded [`PatchesConfig`] settings into a [`SyncConfig`] the sync
/// engine takes directly. Plain plumbing, not a stack factory: the
/// embedder still builds the `Store`/`Transport`/`OnlineState` themselves.
pub fn sync_config(config: &PatchesConfig) -> SyncConfig {
    SyncConfig {
        max_payload_bytes: config.sync.max_payload_bytes_opt(),
        reconnect_debounce: std::time::Duration::from_millis(config.sync.reconnect_debounce_ms),
        shutdown_grace: std::time::Duration::from_millis(config.sync.shutdown_grace_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_conversion_preserves_defaults() {
        let config = PatchesConfig::default();
        let sync = sync_config(&config);
        assert_eq!(sync.max_payload_bytes, Some(64 * 1024));
        assert_eq!(sync.reconnect_debounce, std::time::Duration::from_millis(300));
        assert_eq!(sync.shutdown_grace, std::time::Duration::from_millis(5_000));
    }
}
