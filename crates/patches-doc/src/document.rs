//! [`Document`]: the in-memory replica (§4.2).
//!
//! A replica never talks to the store or the sync engine directly — all
//! coupling flows through the doc manager, which subscribes to this
//! type's mutation notifications. Concurrency is funnelled through one
//! `parking_lot::Mutex` guarding the replica's state, the same
//! single-owner shape `patches-store::MemoryStore` uses; no lock is ever
//! held across an `.await`.

use std::sync::Arc;

use parking_lot::Mutex;
use patches_algorithm::{Strategy, apply_ops};
use patches_types::{Change, Clock, DocId, Operation, Rev, Snapshot};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{DocError, DocResult};
use crate::mutation::DocMutation;

struct ReplicaState {
    base_state: Value,
    committed_rev: Rev,
    pending: Vec<Change>,
    closed: bool,
}

/// The in-memory replica for one tracked document.
pub struct Document {
    doc_id: DocId,
    strategy: Arc<dyn Strategy>,
    clock: Arc<dyn Clock>,
    state: Mutex<ReplicaState>,
    mutations: broadcast::Sender<DocMutation>,
}

impl Document {
    pub fn new(doc_id: DocId, strategy: Arc<dyn Strategy>, clock: Arc<dyn Clock>, snapshot: Snapshot) -> Self {
        let (mutations, _) = broadcast::channel(256);
        Self {
            doc_id,
            strategy,
            clock,
            state: Mutex::new(ReplicaState {
                base_state: snapshot.state,
                committed_rev: snapshot.rev,
                pending: snapshot.changes,
                closed: false,
            }),
            mutations,
        }
    }

    pub fn doc_id(&self) -> &DocId {
        &self.doc_id
    }

    /// Current observable state: base state plus pending ops applied.
    pub fn state(&self) -> Value {
        let state = self.state.lock();
        render_state(&state.base_state, &state.pending)
    }

    pub fn committed_rev(&self) -> Rev {
        self.state.lock().committed_rev
    }

    pub fn has_pending(&self) -> bool {
        !self.state.lock().pending.is_empty()
    }

    pub fn pending(&self) -> Vec<Change> {
        self.state.lock().pending.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Applies a user-supplied mutator to the current state, composes the
    /// operations it produces into the pending queue, updates the
    /// observable state, and notifies subscribers synchronously in
    /// authoring order.
    ///
    /// `mutator` receives the current state and returns the operations
    /// representing the edit (the operation list IS the user's intent;
    /// this core does not diff an edited draft against the original for
    /// the caller).
    pub fn change(&self, mutator: impl FnOnce(&Value) -> Vec<Operation>) -> DocResult<Vec<Operation>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(DocError::Closed);
        }

        let current = render_state(&state.base_state, &state.pending);
        let ops = mutator(&current);
        if ops.is_empty() {
            return Ok(ops);
        }

        apply_ops(&current, &ops)?;
        self.strategy
            .compose_ops(&mut state.pending, ops.clone(), state.committed_rev, self.clock.as_ref())?;
        drop(state);

        let _ = self.mutations.send(DocMutation::local(ops.clone()));
        Ok(ops)
    }

    /// Replaces base state, `committedRev`, and the pending queue
    /// atomically from `snapshot`. Used when the sync engine determines
    /// local pending state has diverged and a full resync is required.
    pub fn import(&self, snapshot: Snapshot) -> DocResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(DocError::Closed);
        }
        state.base_state = snapshot.state;
        state.committed_rev = snapshot.rev;
        state.pending = snapshot.changes;
        drop(state);

        let _ = self.mutations.send(DocMutation::imported());
        Ok(())
    }

    /// The sync engine's fast path: advances `committedRev`, replaces the
    /// pending queue with `new_pending` (already rebased), and recomputes
    /// state by applying `server_changes` to the stored base state.
    pub fn apply_committed_changes(
        &self,
        server_changes: &[Change],
        new_pending: Vec<Change>,
    ) -> DocResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(DocError::Closed);
        }

        let mut base_state = state.base_state.clone();
        for change in server_changes {
            base_state = apply_ops(&base_state, &change.ops)?;
        }
        state.base_state = base_state;
        if let Some(last) = server_changes.last() {
            state.committed_rev = last.rev;
        }
        state.pending = new_pending;
        drop(state);

        let _ = self.mutations.send(DocMutation::committed_applied());
        Ok(())
    }

    /// Registers a listener for mutation notifications. Dropping the
    /// returned receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<DocMutation> {
        self.mutations.subscribe()
    }

    /// Marks the replica closed; subsequent `change`/`import`/
    /// `apply_committed_changes` calls fail with [`DocError::Closed`].
    pub fn close(&self) {
        self.state.lock().closed = true;
    }
}

fn render_state(base_state: &Value, pending: &[Change]) -> Value {
    let mut state = base_state.clone();
    for change in pending {
        match apply_ops(&state, &change.ops) {
            Ok(next) => state = next,
            Err(error) => {
                tracing::error!(%error, "pending change failed to apply while rendering state");
                break;
            }
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use patches_algorithm::OtStrategy;
    use patches_types::{FixedClock, tag};
    use serde_json::json;

    fn doc() -> Document {
        Document::new(
            DocId::new("d1"),
            Arc::new(OtStrategy),
            Arc::new(FixedClock::new(0)),
            Snapshot::new(json!({"title": "draft"}), Rev::PENDING),
        )
    }

    #[test]
    fn change_updates_state_and_notifies_listener() {
        let document = doc();
        let mut rx = document.subscribe();
        let ops = document
            .change(|_state| vec![Operation::new(tag::REPLACE, vec!["title".into()]).with_value(json!("final"))])
            .unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(document.state(), json!({"title": "final"}));
        assert!(document.has_pending());
        let mutation = rx.try_recv().unwrap();
        assert_eq!(mutation.kind, crate::mutation::MutationKind::Local);
    }

    #[test]
    fn change_on_closed_doc_fails() {
        let document = doc();
        document.close();
        let err = document.change(|_| vec![Operation::new(tag::REPLACE, vec!["x".into()]).with_value(json!(1))]);
        assert!(matches!(err, Err(DocError::Closed)));
    }

    #[test]
    fn apply_committed_changes_advances_rev_and_clears_pending_when_confirmed() {
        let document = doc();
        document
            .change(|_| vec![Operation::new(tag::REPLACE, vec!["title".into()]).with_value(json!("mine"))])
            .unwrap();

        let committed = document.pending()[0].committed(Rev::new(1), 1);
        document
            .apply_committed_changes(&[committed], vec![])
            .unwrap();

        assert_eq!(document.committed_rev(), Rev::new(1));
        assert!(!document.has_pending());
        assert_eq!(document.state(), json!({"title": "mine"}));
    }

    #[test]
    fn import_replaces_state_and_pending_wholesale() {
        let document = doc();
        document
            .change(|_| vec![Operation::new(tag::REPLACE, vec!["title".into()]).with_value(json!("mine"))])
            .unwrap();

        document
            .import(Snapshot::new(json!({"title": "server-wins"}), Rev::new(5)))
            .unwrap();

        assert_eq!(document.committed_rev(), Rev::new(5));
        assert!(!document.has_pending());
        assert_eq!(document.state(), json!({"title": "server-wins"}));
    }
}
