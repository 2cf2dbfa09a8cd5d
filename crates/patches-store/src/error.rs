//! Errors the store contract can raise.

use patches_types::DocId;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a [`crate::Store`] implementation.
///
/// These propagate to the sync engine's `onError` signal (see
/// `patches-sync`); a failed `applyServerChanges` leaves `committedRev` and
/// the pending queue untouched so the next sync retries cleanly.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not tracked: {0}")]
    NotTracked(DocId),

    #[error("document already has no committed state: {0}")]
    NoCommittedState(DocId),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("failed to (de)serialize stored document {doc_id}: {source}")]
    Codec {
        doc_id: DocId,
        #[source]
        source: serde_json::Error,
    },
}
