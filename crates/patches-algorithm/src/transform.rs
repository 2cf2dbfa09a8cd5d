//! Operation-level transform: given a remote operation that has already
//! been applied to the shared document, adjust a local (not-yet-applied)
//! operation so replaying it afterwards preserves the author's intent.
//!
//! This is a practical, path-based subset of full operational transform,
//! not a general CRDT: it handles the shapes the spec's operation set
//! actually produces (sibling array inserts/removals, same-author text
//! splice runs, commuting numeric increments) and falls back to dropping
//! the local operation when two edits target the exact same structural
//! path. [`crate::ot::OtStrategy::rebase`] is what actually guarantees
//! internal consistency: whatever this function returns, the resulting
//! state is always computed by applying the server changes and then the
//! transformed pending ops, in that order, so the two can never diverge.

use patches_types::{Operation, PathSegment, tag};

use crate::json_patch::{parse_splice, splice_op};

/// Transforms `local` against an already-applied `remote` operation.
///
/// Returns `None` when `remote` made `local` a no-op (e.g. `remote` deleted
/// the exact array element `local` was targeting).
pub fn transform_op(local: &Operation, remote: &Operation) -> Option<Operation> {
    if local.is_tag(tag::TEXT_SPLICE) && remote.is_tag(tag::TEXT_SPLICE) && local.same_path(remote)
    {
        return transform_text_splice(local, remote);
    }

    if local.is_tag(tag::INCREMENT) && remote.is_tag(tag::INCREMENT) && local.same_path(remote) {
        // Increments commute regardless of order.
        return Some(local.clone());
    }

    if let Some(result) = transform_array_index(local, remote) {
        return result;
    }

    if local.same_path(remote)
        && is_structural(&remote.op)
        && is_structural(&local.op)
        && (local.op != tag::ADD || remote.op != tag::ADD)
    {
        // Same exact target, conflicting structural write: the already
        // committed remote write wins and the pending local write is
        // dropped rather than silently clobbering it on confirm.
        return None;
    }

    Some(local.clone())
}

fn is_structural(tag: &str) -> bool {
    matches!(tag, self::tag::ADD | self::tag::REMOVE | self::tag::REPLACE)
}

/// Sibling-index adjustment: when `local` and `remote` target the same
/// array under the same parent path and `remote` is an `add`/`remove`,
/// shift `local`'s trailing index to keep pointing at the same element.
///
/// Returns `Some(_)` when this rule applied (even if the result is that
/// `local` is dropped), `None` when it doesn't apply and other rules
/// should be tried.
fn transform_array_index(local: &Operation, remote: &Operation) -> Option<Option<Operation>> {
    if local.path.len() != remote.path.len() || local.path.is_empty() {
        return None;
    }
    let depth = local.path.len() - 1;
    if local.path[..depth] != remote.path[..depth] {
        return None;
    }
    let (PathSegment::Index(local_index), PathSegment::Index(remote_index)) =
        (&local.path[depth], &remote.path[depth])
    else {
        return None;
    };
    let (local_index, remote_index) = (*local_index, *remote_index);

    match remote.op.as_str() {
        tag::ADD => {
            let mut shifted = local.clone();
            if remote_index <= local_index {
                shifted.path[depth] = PathSegment::Index(local_index + 1);
            }
            Some(Some(shifted))
        }
        tag::REMOVE => {
            if remote_index == local_index {
                Some(None)
            } else if remote_index < local_index {
                let mut shifted = local.clone();
                shifted.path[depth] = PathSegment::Index(local_index - 1);
                Some(Some(shifted))
            } else {
                Some(Some(local.clone()))
            }
        }
        _ => None,
    }
}

/// Classic index-shift transform for two text splices at the same path.
/// Only the starting index is adjusted for the net length change `remote`
/// introduced before `local`'s position; overlapping delete ranges are not
/// merged character-by-character, which is an accepted limitation of this
/// practical transform (see DESIGN.md).
fn transform_text_splice(local: &Operation, remote: &Operation) -> Option<Operation> {
    let local_splice = parse_splice(local).ok()?;
    let remote_splice = parse_splice(remote).ok()?;
    let remote_insert_len = remote_splice.insert.chars().count();

    let new_index = if remote_splice.index <= local_splice.index {
        let overlap = remote_splice
            .delete
            .min(local_splice.index.saturating_sub(remote_splice.index));
        local_splice.index + remote_insert_len - overlap
    } else {
        local_splice.index
    };

    Some(splice_op(
        local.path.clone(),
        &crate::json_patch::Splice {
            index: new_index,
            delete: local_splice.delete,
            insert: local_splice.insert,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add(path: Vec<PathSegment>, value: serde_json::Value) -> Operation {
        Operation::new(tag::ADD, path).with_value(value)
    }

    fn remove(path: Vec<PathSegment>) -> Operation {
        Operation::new(tag::REMOVE, path)
    }

    #[test]
    fn local_index_shifts_right_when_remote_inserts_before_it() {
        let local = add(vec!["items".into(), 2usize.into()], json!("local"));
        let remote = add(vec!["items".into(), 0usize.into()], json!("remote"));
        let transformed = transform_op(&local, &remote).unwrap();
        assert_eq!(transformed.path, vec!["items".into(), 3usize.into()]);
    }

    #[test]
    fn local_is_dropped_when_remote_removed_its_exact_element() {
        let local = Operation::new(tag::REPLACE, vec!["items".into(), 1usize.into()])
            .with_value(json!("edited"));
        let remote = remove(vec!["items".into(), 1usize.into()]);
        assert!(transform_op(&local, &remote).is_none());
    }

    #[test]
    fn conflicting_replace_at_same_path_drops_local() {
        let local =
            Operation::new(tag::REPLACE, vec!["title".into()]).with_value(json!("mine"));
        let remote =
            Operation::new(tag::REPLACE, vec!["title".into()]).with_value(json!("theirs"));
        assert!(transform_op(&local, &remote).is_none());
    }

    #[test]
    fn increments_at_same_path_pass_through_unchanged() {
        let local = Operation::new(tag::INCREMENT, vec!["count".into()]).with_value(json!(1));
        let remote = Operation::new(tag::INCREMENT, vec!["count".into()]).with_value(json!(2));
        let transformed = transform_op(&local, &remote).unwrap();
        assert_eq!(transformed.value, Some(json!(1)));
    }

    #[test]
    fn text_splice_index_shifts_past_earlier_remote_insert() {
        let local = crate::json_patch::splice_op(
            vec!["body".into()],
            &crate::json_patch::Splice {
                index: 5,
                delete: 0,
                insert: "X".into(),
            },
        );
        let remote = crate::json_patch::splice_op(
            vec!["body".into()],
            &crate::json_patch::Splice {
                index: 0,
                delete: 0,
                insert: "abc".into(),
            },
        );
        let transformed = transform_op(&local, &remote).unwrap();
        let splice = parse_splice(&transformed).unwrap();
        assert_eq!(splice.index, 8);
    }

    #[test]
    fn unrelated_paths_pass_through_unchanged() {
        let local = add(vec!["a".into()], json!(1));
        let remote = add(vec!["b".into()], json!(2));
        assert_eq!(transform_op(&local, &remote), Some(local));
    }
}
