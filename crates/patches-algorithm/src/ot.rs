//! The operational-transform strategy: pending changes survive a rebase by
//! having their operations transformed against each server operation in
//! turn, rather than being discarded outright.

use patches_types::{AlgorithmKind, Change, Clock, Operation, Rev};
use serde_json::Value;

use crate::compose::{append_change, try_collapse_text_splice};
use crate::error::AlgorithmResult;
use crate::json_patch::apply_ops;
use crate::strategy::Strategy;
use crate::transform::transform_op;

/// True per-operation rebase. Appropriate for documents whose shape
/// benefits from fine-grained merges (rich text, structured lists) at the
/// cost of the more involved transform logic in [`transform_op`].
#[derive(Debug, Default)]
pub struct OtStrategy;

impl Strategy for OtStrategy {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Ot
    }

    fn compose_ops(
        &self,
        pending: &mut Vec<Change>,
        ops: Vec<Operation>,
        committed_rev: Rev,
        clock: &dyn Clock,
    ) -> AlgorithmResult<()> {
        if try_collapse_text_splice(pending, &ops) {
            return Ok(());
        }
        append_change(pending, ops, committed_rev, clock)
    }

    fn rebase(
        &self,
        pending: &[Change],
        server_changes: &[Change],
        base_state: &Value,
    ) -> AlgorithmResult<(Vec<Change>, Value)> {
        if server_changes.is_empty() {
            return Ok((pending.to_vec(), base_state.clone()));
        }

        let mut state = apply_ops(
            base_state,
            &server_changes
                .iter()
                .flat_map(|change| change.ops.clone())
                .collect::<Vec<_>>(),
        )?;

        debug_assert!(!server_changes.is_empty());
        let last_server_rev = server_changes[server_changes.len() - 1].rev;

        let mut rebased = Vec::with_capacity(pending.len());
        for change in pending {
            let mut ops = change.ops.clone();
            for server_change in server_changes {
                for server_op in &server_change.ops {
                    ops = ops
                        .into_iter()
                        .filter_map(|op| transform_op(&op, server_op))
                        .collect();
                }
                if ops.is_empty() {
                    break;
                }
            }
            if ops.is_empty() {
                continue;
            }
            let mut next = change.clone();
            next.ops = ops;
            next.base_rev = last_server_rev;
            rebased.push(next);
        }

        let pending_ops: Vec<Operation> = rebased
            .iter()
            .flat_map(|change| change.ops.clone())
            .collect();
        state = apply_ops(&state, &pending_ops)?;

        Ok((rebased, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patches_types::{ChangeId, tag};
    use serde_json::json;

    fn server_change(rev: u64, ops: Vec<Operation>) -> Change {
        Change::new_pending(ChangeId::new_random(), ops, Rev::new(rev - 1), 0).committed(Rev::new(rev), 1)
    }

    fn pending_change(ops: Vec<Operation>) -> Change {
        Change::new_pending(ChangeId::new_random(), ops, Rev::new(1), 0)
    }

    #[test]
    fn rebase_shifts_pending_array_index_past_server_insert() {
        let strategy = OtStrategy;
        let base_state = json!({"items": ["a", "b"]});
        let server = vec![server_change(
            2,
            vec![Operation::new(tag::ADD, vec!["items".into(), 0usize.into()])
                .with_value(json!("z"))],
        )];
        let pending = vec![pending_change(vec![Operation::new(
            tag::REPLACE,
            vec!["items".into(), 1usize.into()],
        )
        .with_value(json!("b-edited"))])];

        let (rebased, state) = strategy.rebase(&pending, &server, &base_state).unwrap();
        assert_eq!(rebased.len(), 1);
        assert_eq!(
            rebased[0].ops[0].path,
            vec!["items".into(), 2usize.into()]
        );
        assert_eq!(state, json!({"items": ["z", "a", "b-edited"]}));
    }

    #[test]
    fn rebase_is_identity_with_no_server_changes() {
        let strategy = OtStrategy;
        let base_state = json!({"x": 1});
        let pending = vec![pending_change(vec![Operation::new(
            tag::REPLACE,
            vec!["x".into()],
        )
        .with_value(json!(2))])];
        let (rebased, state) = strategy.rebase(&pending, &[], &base_state).unwrap();
        assert_eq!(rebased, pending);
        assert_eq!(state, json!({"x": 1}));
    }

    #[test]
    fn rebase_drops_pending_change_left_with_no_surviving_ops() {
        let strategy = OtStrategy;
        let base_state = json!({"items": ["a"]});
        let server = vec![server_change(
            2,
            vec![Operation::new(tag::REMOVE, vec!["items".into(), 0usize.into()])],
        )];
        let pending = vec![pending_change(vec![Operation::new(
            tag::REPLACE,
            vec!["items".into(), 0usize.into()],
        )
        .with_value(json!("edited"))])];

        let (rebased, state) = strategy.rebase(&pending, &server, &base_state).unwrap();
        assert!(rebased.is_empty());
        assert_eq!(state, json!({"items": []}));
    }
}
