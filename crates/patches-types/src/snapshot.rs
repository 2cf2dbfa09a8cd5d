//! [`Snapshot`]: document state at a revision, plus the pending queue.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::change::Change;
use crate::ids::Rev;

/// A document state at a particular committed revision, with any pending
/// local changes layered on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Base state at `rev` (server-confirmed, no pending changes applied).
    pub state: Value,
    /// The committed revision `state` reflects.
    pub rev: Rev,
    /// Ordered pending local changes layered on top of `state@rev`.
    pub changes: Vec<Change>,
}

impl Snapshot {
    pub fn new(state: Value, rev: Rev) -> Self {
        Self {
            state,
            rev,
            changes: Vec::new(),
        }
    }

    pub fn with_pending(mut self, changes: Vec<Change>) -> Self {
        self.changes = changes;
        self
    }

    pub fn has_pending(&self) -> bool {
        !self.changes.is_empty()
    }
}
