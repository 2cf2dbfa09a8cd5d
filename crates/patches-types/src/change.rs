//! [`Change`]: the unit of synchronization.

use serde::{Deserialize, Serialize};

use crate::ids::{BatchId, ChangeId, Rev};
use crate::operation::Operation;

/// The unit of synchronization: a non-empty, ordered sequence of operations
/// produced by a single author, applied left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub id: ChangeId,
    pub ops: Vec<Operation>,
    /// The committed revision the author saw when producing this change.
    pub base_rev: Rev,
    /// `0` while pending; a positive, strictly increasing integer once
    /// committed by the server.
    pub rev: Rev,
    /// Authoring timestamp, milliseconds since the epoch.
    pub created_at: i64,
    /// Server-assigned timestamp; absent while pending.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub committed_at: Option<i64>,
    /// Set when a single logical change was split across several wire
    /// batches to honour the transport's payload budget.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub batch_id: Option<BatchId>,
}

impl Change {
    /// Builds a new pending change authored just now.
    ///
    /// `ops` must be non-empty; the algorithm strategy is responsible for
    /// enforcing this at composition time (see `compose_ops`).
    pub fn new_pending(id: ChangeId, ops: Vec<Operation>, base_rev: Rev, created_at: i64) -> Self {
        Self {
            id,
            ops,
            base_rev,
            rev: Rev::PENDING,
            created_at,
            committed_at: None,
            batch_id: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.rev.is_pending()
    }

    pub fn is_empty_ops(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns a copy of this change marked committed at `rev`/`committed_at`.
    pub fn committed(&self, rev: Rev, committed_at: i64) -> Self {
        let mut copy = self.clone();
        copy.rev = rev;
        copy.committed_at = Some(committed_at);
        copy
    }

    /// Approximate JSON-encoded size in bytes, used by the batching budget.
    pub fn encoded_len(&self) -> usize {
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or(0)
    }
}

/// The conflict-resolution strategy a document is bound to.
///
/// Bound once, at `trackDocs` time, and recorded in the [`TrackedDoc`](crate::TrackedDoc)
/// record so the next session loads it consistently; treated as immutable
/// for a document's lifetime (see the "strategy switching mid-life" open
/// question resolved in DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKind {
    /// Operational-transform strategy: true per-operation rebase.
    Ot,
    /// Last-writer-wins: pending changes whose target paths were also
    /// written by incoming server changes are discarded on rebase.
    Lww,
}

impl Default for AlgorithmKind {
    fn default() -> Self {
        AlgorithmKind::Ot
    }
}
