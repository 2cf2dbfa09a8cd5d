//! Property test for the rebase consistency guarantee every strategy must
//! hold: rebasing pending changes against server changes must produce the
//! exact state you'd get by applying the server changes then the rebased
//! pending changes, in order, to the same base state. Both strategies
//! compute their returned state this way by construction, so this is a
//! regression guard against an implementation drifting away from that.

use patches_algorithm::{apply_ops, OtStrategy, Strategy};
use patches_types::{Change, ChangeId, Operation, Rev, tag};
use proptest::prelude::*;
use serde_json::json;

fn replace_op(field: &str, value: i64) -> Operation {
    Operation::new(tag::REPLACE, vec![field.into()]).with_value(json!(value))
}

fn change(field: &str, value: i64, base_rev: u64) -> Change {
    Change::new_pending(
        ChangeId::new_random(),
        vec![replace_op(field, value)],
        Rev::new(base_rev),
        0,
    )
}

proptest! {
    #[test]
    fn ot_rebase_state_matches_sequential_replay(
        pending_values in prop::collection::vec(-100i64..100, 0..5),
        server_values in prop::collection::vec(-100i64..100, 0..5),
    ) {
        let strategy = OtStrategy;
        let base_state = json!({"a": 0, "b": 0});

        let pending: Vec<Change> = pending_values
            .iter()
            .enumerate()
            .map(|(i, v)| change(if i % 2 == 0 { "a" } else { "b" }, *v, 1))
            .collect();
        let server: Vec<Change> = server_values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                change(if i % 2 == 0 { "a" } else { "b" }, *v, i as u64)
                    .committed(Rev::new(i as u64 + 1), 0)
            })
            .collect();

        let (rebased, state) = strategy.rebase(&pending, &server, &base_state).unwrap();

        let mut replay = base_state.clone();
        for c in &server {
            replay = apply_ops(&replay, &c.ops).unwrap();
        }
        for c in &rebased {
            replay = apply_ops(&replay, &c.ops).unwrap();
        }

        prop_assert_eq!(state, replay);
    }
}
