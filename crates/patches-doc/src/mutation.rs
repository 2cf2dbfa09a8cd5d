//! The event a [`crate::Document`] subscriber receives.

use patches_types::Operation;

/// What kind of change produced a [`DocMutation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// A local `change()` call composed new operations.
    Local,
    /// `import()` replaced the replica's state wholesale.
    Imported,
    /// `applyCommittedChanges()` advanced the replica past newly confirmed
    /// server changes.
    CommittedApplied,
}

/// One notification delivered to every subscriber, in authoring order.
#[derive(Debug, Clone)]
pub struct DocMutation {
    pub kind: MutationKind,
    /// The operations produced by a local mutation. `None` for
    /// `Imported`/`CommittedApplied`, which summarise a whole-state
    /// replacement rather than a discrete op list.
    pub ops: Option<Vec<Operation>>,
}

impl DocMutation {
    pub fn local(ops: Vec<Operation>) -> Self {
        Self {
            kind: MutationKind::Local,
            ops: Some(ops),
        }
    }

    pub fn imported() -> Self {
        Self {
            kind: MutationKind::Imported,
            ops: None,
        }
    }

    pub fn committed_applied() -> Self {
        Self {
            kind: MutationKind::CommittedApplied,
            ops: None,
        }
    }
}
