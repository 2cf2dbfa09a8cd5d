//! Persistent tracked-document metadata and the observable synced-status
//! projection.

use serde::{Deserialize, Serialize};

use crate::change::AlgorithmKind;
use crate::ids::{DocId, Rev};

/// Persistent metadata the store keeps per tracked document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDoc {
    pub doc_id: DocId,
    /// The highest server-confirmed revision the local store has durably
    /// applied.
    pub committed_rev: Rev,
    /// Set once `deleteDoc` has been called locally; persists as a
    /// tombstone until the server confirms deletion.
    #[serde(default)]
    pub deleted: bool,
    /// The strategy bound to this document, if one has been chosen yet.
    #[serde(default)]
    pub algorithm: Option<AlgorithmKind>,
}

impl TrackedDoc {
    pub fn new(doc_id: DocId) -> Self {
        Self {
            doc_id,
            committed_rev: Rev::PENDING,
            deleted: false,
            algorithm: None,
        }
    }

    pub fn with_algorithm(mut self, algorithm: AlgorithmKind) -> Self {
        self.algorithm = Some(algorithm);
        self
    }
}

/// Observable sync lifecycle for a single document (see `PatchesSync::synced`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Unsynced,
    Synced,
    Syncing,
    Error,
}

/// The denormalised per-document projection the sync engine maintains and
/// broadcasts via `onSyncedChange`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedEntry {
    pub committed_rev: Rev,
    pub has_pending: bool,
    pub status: SyncStatus,
}

impl SyncedEntry {
    pub fn new(committed_rev: Rev, has_pending: bool, status: SyncStatus) -> Self {
        Self {
            committed_rev,
            has_pending,
            status,
        }
    }
}
