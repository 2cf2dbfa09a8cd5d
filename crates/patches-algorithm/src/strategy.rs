//! The [`Strategy`] trait: the pure, swappable conflict-resolution kernel
//! a tracked document is bound to at track time.
//!
//! A strategy is a pure function of its inputs, has no IO, and every
//! method here is safe to call from a single-threaded, non-async context
//! (the manager/sync layers own concurrency; this crate never sees it).

use patches_types::{AlgorithmKind, Change, Clock, Operation, Rev};
use serde_json::Value;

use crate::error::AlgorithmResult;

/// A conflict-resolution strategy: composes freshly authored operations
/// into the pending queue, rebases that queue against newly committed
/// server changes, and trims confirmed entries off the front.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> AlgorithmKind;

    /// Appends `ops` to `pending` as one (or, for `@txt` continuations
    /// under the OT strategy, an extended) pending [`Change`].
    ///
    /// `committed_rev` is the document's last known committed revision,
    /// recorded as the new change's `base_rev`.
    fn compose_ops(
        &self,
        pending: &mut Vec<Change>,
        ops: Vec<Operation>,
        committed_rev: Rev,
        clock: &dyn Clock,
    ) -> AlgorithmResult<()>;

    /// Rebases `pending` against `server_changes`, which were just
    /// committed on top of `base_state` (the document state at the
    /// revision `server_changes[0].base_rev` refers to).
    ///
    /// Returns the surviving pending changes (with `base_rev` advanced to
    /// the latest server revision) and the resulting document state —
    /// always computed as `server_changes` then the returned pending
    /// changes applied, in order, to `base_state`, so this never diverges
    /// from a direct replay.
    fn rebase(
        &self,
        pending: &[Change],
        server_changes: &[Change],
        base_state: &Value,
    ) -> AlgorithmResult<(Vec<Change>, Value)>;

    /// Removes the leading `committed.len()` entries of `pending`: the
    /// server has now acknowledged them and they move from "pending" to
    /// "committed" bookkeeping in the store.
    fn confirm(&self, pending: &[Change], committed: &[Change]) -> Vec<Change> {
        default_confirm(pending, committed)
    }
}

pub(crate) fn default_confirm(pending: &[Change], committed: &[Change]) -> Vec<Change> {
    pending
        .iter()
        .skip(committed.len())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use patches_types::{ChangeId, Operation};

    fn change(rev: u64) -> Change {
        Change::new_pending(
            ChangeId::new_random(),
            vec![Operation::new("replace", vec!["x".into()])],
            Rev::new(rev),
            0,
        )
    }

    #[test]
    fn default_confirm_drops_leading_entries() {
        let pending = vec![change(1), change(1), change(1)];
        let committed = vec![change(2)];
        let remaining = default_confirm(&pending, &committed);
        assert_eq!(remaining.len(), 2);
    }
}
