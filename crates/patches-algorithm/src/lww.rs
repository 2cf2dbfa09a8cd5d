//! The last-writer-wins strategy: a pending change survives a rebase only
//! if none of its operations touch a path any server operation also wrote.
//! Simpler and cheaper than [`crate::ot::OtStrategy`], at the cost of
//! discarding local edits outright instead of merging them.

use patches_types::{AlgorithmKind, Change, Clock, Operation, Rev};
use serde_json::Value;

use crate::compose::append_change;
use crate::error::AlgorithmResult;
use crate::json_patch::apply_ops;
use crate::strategy::Strategy;

#[derive(Debug, Default)]
pub struct LwwStrategy;

impl Strategy for LwwStrategy {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Lww
    }

    fn compose_ops(
        &self,
        pending: &mut Vec<Change>,
        ops: Vec<Operation>,
        committed_rev: Rev,
        clock: &dyn Clock,
    ) -> AlgorithmResult<()> {
        // Never collapsed: each authored edit is its own change so a later
        // conflicting server write can drop exactly the right one.
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

        let server_ops: Vec<&Operation> = server_changes
            .iter()
            .flat_map(|change| change.ops.iter())
            .collect();

        let mut state = apply_ops(
            base_state,
            &server_changes
                .iter()
                .flat_map(|change| change.ops.clone())
                .collect::<Vec<_>>(),
        )?;

        debug_assert!(!server_changes.is_empty());
        let last_server_rev = server_changes[server_changes.len() - 1].rev;

        let mut survivors = Vec::with_capacity(pending.len());
        for change in pending {
            let conflicts = change
                .ops
                .iter()
                .any(|op| server_ops.iter().any(|server_op| op.path_intersects(server_op)));
            if conflicts {
                continue;
            }
            let mut next = change.clone();
            next.base_rev = last_server_rev;
            survivors.push(next);
        }

        let pending_ops: Vec<Operation> = survivors
            .iter()
            .flat_map(|change| change.ops.clone())
            .collect();
        state = apply_ops(&state, &pending_ops)?;

        Ok((survivors, state))
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
    fn rebase_drops_pending_change_touching_a_server_written_path() {
        let strategy = LwwStrategy;
        let base_state = json!({"title": "draft", "body": "hi"});
        let server = vec![server_change(
            2,
            vec![Operation::new(tag::REPLACE, vec!["title".into()]).with_value(json!("v2"))],
        )];
        let pending = vec![
            pending_change(vec![
                Operation::new(tag::REPLACE, vec!["title".into()]).with_value(json!("mine")),
            ]),
            pending_change(vec![
                Operation::new(tag::REPLACE, vec!["body".into()]).with_value(json!("edited")),
            ]),
        ];

        let (rebased, state) = strategy.rebase(&pending, &server, &base_state).unwrap();
        assert_eq!(rebased.len(), 1);
        assert_eq!(state, json!({"title": "v2", "body": "edited"}));
    }

    #[test]
    fn rebase_keeps_everything_when_paths_are_disjoint() {
        let strategy = LwwStrategy;
        let base_state = json!({"a": 1, "b": 2});
        let server = vec![server_change(
            2,
            vec![Operation::new(tag::REPLACE, vec!["a".into()]).with_value(json!(10))],
        )];
        let pending = vec![pending_change(vec![
            Operation::new(tag::REPLACE, vec!["b".into()]).with_value(json!(20)),
        ])];

        let (rebased, state) = strategy.rebase(&pending, &server, &base_state).unwrap();
        assert_eq!(rebased.len(), 1);
        assert_eq!(state, json!({"a": 10, "b": 20}));
    }
}
