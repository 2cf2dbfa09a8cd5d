//! `break_into_batches` (§4.6): greedily packs a pending queue into wire
//! batches that respect the transport's payload budget.

use patches_types::{BatchId, Change};

/// Array brackets account for two of the budget's bytes even with zero
/// elements; commas between elements are accounted for per push below.
const ARRAY_OVERHEAD: usize = 2;

/// Splits `pending` into one or more batches whose JSON-encoded size stays
/// within `max_payload_bytes`.
///
/// - No budget, or the whole queue already fits: one batch, unchanged.
/// - Otherwise: a fresh [`BatchId`] is stamped onto every change across all
///   resulting batches (they all trace back to this one split), and
///   changes are greedily packed in order. A single change that alone
///   exceeds the budget still gets its own batch — it is sent, not
///   dropped, with a warning logged.
pub fn break_into_batches(pending: &[Change], max_payload_bytes: Option<usize>) -> Vec<Vec<Change>> {
    let Some(budget) = max_payload_bytes else {
        return vec![pending.to_vec()];
    };
    if pending.is_empty() {
        return vec![];
    }
    if encoded_len(pending) <= budget {
        return vec![pending.to_vec()];
    }

    let batch_id = BatchId::new_random();
    let mut batches = Vec::new();
    let mut current: Vec<Change> = Vec::new();
    let mut current_size = ARRAY_OVERHEAD;

    for change in pending {
        let mut change = change.clone();
        change.batch_id = Some(batch_id);
        let change_len = change.encoded_len();

        if change_len + ARRAY_OVERHEAD > budget {
            tracing::warn!(
                change_id = %change.id,
                change_len,
                budget,
                "change exceeds transport payload budget; sending it alone"
            );
        }

        let additive = change_len + usize::from(!current.is_empty());
        if !current.is_empty() && current_size + additive > budget {
            batches.push(std::mem::take(&mut current));
            current_size = ARRAY_OVERHEAD;
        }
        current_size += change_len + usize::from(!current.is_empty());
        current.push(change);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

fn encoded_len(changes: &[Change]) -> usize {
    serde_json::to_vec(changes).map(|v| v.len()).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use patches_types::{ChangeId, Operation, Rev, tag};
    use serde_json::json;

    fn change_with_text(text: &str) -> Change {
        Change::new_pending(
            ChangeId::new_random(),
            vec![Operation::new(tag::REPLACE, vec!["body".into()]).with_value(json!(text))],
            Rev::new(1),
            0,
        )
    }

    #[test]
    fn no_budget_returns_single_batch() {
        let pending = vec![change_with_text("a"), change_with_text("b")];
        let batches = break_into_batches(&pending, None);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[test]
    fn small_pending_fits_in_one_batch() {
        let pending = vec![change_with_text("a")];
        let batches = break_into_batches(&pending, Some(10_000));
        assert_eq!(batches.len(), 1);
    }

    #[test]
    fn oversized_pending_splits_with_shared_batch_id() {
        let pending = vec![
            change_with_text(&"x".repeat(800)),
            change_with_text(&"y".repeat(900)),
            change_with_text(&"z".repeat(800)),
        ];
        let budget = 1024;
        let batches = break_into_batches(&pending, Some(budget));
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|batch| batch.len() == 1));

        let batch_ids: Vec<_> = batches
            .iter()
            .flat_map(|batch| batch.iter().map(|c| c.batch_id))
            .collect();
        assert!(batch_ids.iter().all(|id| id.is_some()));
        assert!(batch_ids.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn empty_pending_produces_no_batches() {
        assert!(break_into_batches(&[], Some(100)).is_empty());
    }
}
