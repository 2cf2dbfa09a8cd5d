//! Shared machinery for turning freshly authored operations into a pending
//! [`Change`], including the OT strategy's same-author text-splice
//! collapsing optimization.

use patches_types::{Change, ChangeId, Clock, Operation, Rev, tag};

use crate::error::{AlgorithmError, AlgorithmResult};
use crate::json_patch::{parse_splice, splice_op, Splice};

/// Appends `ops` as a brand new pending change. Used by both strategies as
/// the fallback when no collapsing applies.
pub fn append_change(
    pending: &mut Vec<Change>,
    ops: Vec<Operation>,
    committed_rev: Rev,
    clock: &dyn Clock,
) -> AlgorithmResult<()> {
    if ops.is_empty() {
        return Err(AlgorithmError::EmptyOps);
    }
    pending.push(Change::new_pending(
        ChangeId::new_random(),
        ops,
        committed_rev,
        clock.now_millis(),
    ));
    Ok(())
}

/// Tries to collapse `ops` into the last pending change when both are a
/// single `@txt` splice at the same path and `ops` picks up exactly where
/// the previous splice left off (a pure insert continuation, as produced by
/// normal typing). Returns `true` if it consumed `ops` by merging.
///
/// This is the one place this core optimizes the OT strategy's pending
/// queue rather than letting it grow one change per keystroke; it is not
/// attempted for LWW, whose changes are never split this finely.
pub fn try_collapse_text_splice(pending: &mut [Change], ops: &[Operation]) -> bool {
    let ([incoming], Some(last)) = (ops, pending.last_mut()) else {
        return false;
    };
    if !incoming.is_tag(tag::TEXT_SPLICE) || !last.is_pending() || last.ops.len() != 1 {
        return false;
    }
    let previous = &last.ops[0];
    if !previous.is_tag(tag::TEXT_SPLICE) || !previous.same_path(incoming) {
        return false;
    }
    let (Ok(prev_splice), Ok(next_splice)) = (parse_splice(previous), parse_splice(incoming))
    else {
        return false;
    };
    let continues_previous =
        next_splice.delete == 0 && next_splice.index == prev_splice.index + prev_splice.insert.chars().count();
    if !continues_previous {
        return false;
    }
    let merged = Splice {
        index: prev_splice.index,
        delete: prev_splice.delete,
        insert: format!("{}{}", prev_splice.insert, next_splice.insert),
    };
    last.ops = vec![splice_op(previous.path.clone(), &merged)];
    true
}
