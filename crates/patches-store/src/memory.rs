//! [`MemoryStore`]: an in-process reference implementation of [`Store`].
//!
//! Concrete durable backends (embedded key-value, browser-local storage)
//! are named out of scope; this one exists so the manager and sync engine
//! are fully testable without one, and to pin down the atomicity contract
//! every real backend must honour. Mutations are guarded by a single
//! `parking_lot::Mutex` — short, synchronous critical sections, never held
//! across an `.await` — the same "funnel through one owner" shape §5
//! prescribes for the engine's state.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use patches_algorithm::apply_ops;
use patches_types::{AlgorithmKind, Change, DocId, Rev, Snapshot, TrackedDoc};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::store::Store;

#[derive(Debug, Clone)]
struct DocRecord {
    tracked: TrackedDoc,
    state: Value,
    pending: Vec<Change>,
}

impl DocRecord {
    fn new(doc_id: DocId, algorithm: Option<AlgorithmKind>) -> Self {
        let mut tracked = TrackedDoc::new(doc_id);
        tracked.algorithm = algorithm;
        Self {
            tracked,
            state: Value::Null,
            pending: Vec::new(),
        }
    }
}

/// An in-memory [`Store`]. Not durable across process restarts — see
/// DESIGN.md for why the durability property (P1) is exercised against
/// this store structurally rather than literally across a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<DocId, DocRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn track_docs(&self, ids: &[DocId], algorithm: Option<AlgorithmKind>) -> StoreResult<()> {
        let mut docs = self.docs.lock();
        for id in ids {
            docs.entry(id.clone())
                .and_modify(|record| record.tracked.deleted = false)
                .or_insert_with(|| DocRecord::new(id.clone(), algorithm));
        }
        Ok(())
    }

    async fn untrack_docs(&self, ids: &[DocId]) -> StoreResult<()> {
        let mut docs = self.docs.lock();
        for id in ids {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list_docs(&self, include_deleted: bool) -> StoreResult<Vec<TrackedDoc>> {
        let docs = self.docs.lock();
        Ok(docs
            .values()
            .filter(|record| include_deleted || !record.tracked.deleted)
            .map(|record| record.tracked.clone())
            .collect())
    }

    async fn get_doc(&self, id: &DocId) -> StoreResult<Option<Snapshot>> {
        let docs = self.docs.lock();
        Ok(docs.get(id).map(|record| {
            Snapshot::new(record.state.clone(), record.tracked.committed_rev)
                .with_pending(record.pending.clone())
        }))
    }

    async fn get_committed_rev(&self, id: &DocId) -> StoreResult<Rev> {
        let docs = self.docs.lock();
        Ok(docs
            .get(id)
            .map(|record| record.tracked.committed_rev)
            .unwrap_or(Rev::PENDING))
    }

    async fn get_pending_changes(&self, id: &DocId) -> StoreResult<Vec<Change>> {
        let docs = self.docs.lock();
        Ok(docs
            .get(id)
            .map(|record| record.pending.clone())
            .unwrap_or_default())
    }

    async fn save_doc(&self, id: &DocId, state: Value, rev: Rev) -> StoreResult<()> {
        let mut docs = self.docs.lock();
        let record = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotTracked(id.clone()))?;
        record.state = state;
        record.tracked.committed_rev = rev;
        Ok(())
    }

    async fn save_pending_changes(&self, id: &DocId, changes: Vec<Change>) -> StoreResult<()> {
        let mut docs = self.docs.lock();
        let record = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotTracked(id.clone()))?;
        record.pending = changes;
        Ok(())
    }

    async fn apply_server_changes(
        &self,
        id: &DocId,
        server_changes: &[Change],
        rebased_pending: Vec<Change>,
    ) -> StoreResult<()> {
        let mut docs = self.docs.lock();
        let record = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotTracked(id.clone()))?;

        let mut state = record.state.clone();
        for change in server_changes {
            state = apply_ops(&state, &change.ops).map_err(|source| {
                StoreError::Backend(format!("applying server change to {id}: {source}"))
            })?;
        }

        record.state = state;
        if let Some(last) = server_changes.last() {
            record.tracked.committed_rev = last.rev;
        }
        record.pending = rebased_pending;
        Ok(())
    }

    async fn delete_doc(&self, id: &DocId) -> StoreResult<()> {
        let mut docs = self.docs.lock();
        let record = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotTracked(id.clone()))?;
        record.tracked.deleted = true;
        Ok(())
    }

    async fn confirm_delete_doc(&self, id: &DocId) -> StoreResult<()> {
        let mut docs = self.docs.lock();
        docs.remove(id);
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patches_types::{ChangeId, Operation, tag};
    use serde_json::json;

    fn doc_id() -> DocId {
        DocId::new("doc-1")
    }

    #[tokio::test]
    async fn track_then_get_doc_returns_empty_snapshot() {
        let store = MemoryStore::new();
        store.track_docs(&[doc_id()], None).await.unwrap();
        let snapshot = store.get_doc(&doc_id()).await.unwrap().unwrap();
        assert_eq!(snapshot.rev, Rev::PENDING);
        assert!(!snapshot.has_pending());
    }

    #[tokio::test]
    async fn save_pending_then_get_round_trips() {
        let store = MemoryStore::new();
        store.track_docs(&[doc_id()], None).await.unwrap();
        let change = Change::new_pending(
            ChangeId::new_random(),
            vec![Operation::new(tag::REPLACE, vec!["title".into()]).with_value(json!("a"))],
            Rev::PENDING,
            1,
        );
        store
            .save_pending_changes(&doc_id(), vec![change.clone()])
            .await
            .unwrap();
        let pending = store.get_pending_changes(&doc_id()).await.unwrap();
        assert_eq!(pending, vec![change]);
    }

    #[tokio::test]
    async fn apply_server_changes_advances_rev_and_rewrites_state() {
        let store = MemoryStore::new();
        store.track_docs(&[doc_id()], None).await.unwrap();
        store
            .save_doc(&doc_id(), json!({"title": "draft"}), Rev::PENDING)
            .await
            .unwrap();

        let server_change = Change::new_pending(
            ChangeId::new_random(),
            vec![Operation::new(tag::REPLACE, vec!["title".into()]).with_value(json!("v2"))],
            Rev::PENDING,
            1,
        )
        .committed(Rev::new(1), 2);

        store
            .apply_server_changes(&doc_id(), &[server_change], vec![])
            .await
            .unwrap();

        let snapshot = store.get_doc(&doc_id()).await.unwrap().unwrap();
        assert_eq!(snapshot.rev, Rev::new(1));
        assert_eq!(snapshot.state, json!({"title": "v2"}));
    }

    #[tokio::test]
    async fn delete_doc_tombstones_until_confirmed() {
        let store = MemoryStore::new();
        store.track_docs(&[doc_id()], None).await.unwrap();
        store.delete_doc(&doc_id()).await.unwrap();

        assert!(store.list_docs(false).await.unwrap().is_empty());
        let with_deleted = store.list_docs(true).await.unwrap();
        assert_eq!(with_deleted.len(), 1);
        assert!(with_deleted[0].deleted);

        store.confirm_delete_doc(&doc_id()).await.unwrap();
        assert!(store.list_docs(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn untracked_doc_operations_fail() {
        let store = MemoryStore::new();
        let err = store.save_doc(&doc_id(), json!({}), Rev::PENDING).await;
        assert!(matches!(err, Err(StoreError::NotTracked(_))));
    }
}
