//! The [`Store`] trait: the persistence contract named in §6.1. All methods
//! are async and may fail with [`StoreError`]; `apply_server_changes` is
//! the one composite operation an implementation must make atomic from a
//! reader's point of view — advancing `committedRev`, overwriting base
//! state, and replacing the pending queue all happen, or none do.

use async_trait::async_trait;
use patches_types::{AlgorithmKind, Change, DocId, Rev, Snapshot, TrackedDoc};
use serde_json::Value;

use crate::error::StoreResult;

#[async_trait]
pub trait Store: Send + Sync {
    /// Begins tracking `ids`. Idempotent; reactivates any tombstones among
    /// them. Newly tracked documents start at `committedRev = 0`.
    async fn track_docs(&self, ids: &[DocId], algorithm: Option<AlgorithmKind>) -> StoreResult<()>;

    /// Removes all local data for `ids`. Non-collaborative: does not notify
    /// the server.
    async fn untrack_docs(&self, ids: &[DocId]) -> StoreResult<()>;

    /// Enumerates tracked-doc records, including tombstones when
    /// `include_deleted` is set.
    async fn list_docs(&self, include_deleted: bool) -> StoreResult<Vec<TrackedDoc>>;

    /// Returns the current snapshot (base state, revision, pending queue),
    /// or `None` if `id` is not tracked.
    async fn get_doc(&self, id: &DocId) -> StoreResult<Option<Snapshot>>;

    /// Last confirmed revision, or `Rev::PENDING` if none yet.
    async fn get_committed_rev(&self, id: &DocId) -> StoreResult<Rev>;

    /// The ordered pending queue for `id`.
    async fn get_pending_changes(&self, id: &DocId) -> StoreResult<Vec<Change>>;

    /// Overwrites the base state and the revision it reflects.
    async fn save_doc(&self, id: &DocId, state: Value, rev: Rev) -> StoreResult<()>;

    /// Replaces the pending queue wholesale.
    async fn save_pending_changes(&self, id: &DocId, changes: Vec<Change>) -> StoreResult<()>;

    /// Atomically advances `committedRev`, applies `server_changes` to the
    /// stored base state, and replaces the pending queue with
    /// `rebased_pending`.
    async fn apply_server_changes(
        &self,
        id: &DocId,
        server_changes: &[Change],
        rebased_pending: Vec<Change>,
    ) -> StoreResult<()>;

    /// Marks `id` as a tombstone; local data remains readable until
    /// [`Store::confirm_delete_doc`].
    async fn delete_doc(&self, id: &DocId) -> StoreResult<()>;

    /// Removes all trace of a tombstoned document once the server has
    /// confirmed the deletion.
    async fn confirm_delete_doc(&self, id: &DocId) -> StoreResult<()>;

    /// Flushes and releases any held resources.
    async fn close(&self) -> StoreResult<()>;
}
