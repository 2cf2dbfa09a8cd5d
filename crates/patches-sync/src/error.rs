//! Error taxonomy for the sync engine (§7).

use patches_algorithm::AlgorithmError;
use patches_doc::DocError;
use patches_store::StoreError;
use patches_transport::TransportError;
use patches_types::DocId;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("document not tracked: {0}")]
    NotTracked(DocId),

    #[error("not connected")]
    NotConnected,

    #[error("flush failed for {doc_id}: {cause}")]
    FlushFailed { doc_id: DocId, cause: TransportError },

    #[error("sync failed for {doc_id}: {cause}")]
    SyncFailed { doc_id: DocId, cause: TransportError },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Doc(#[from] DocError),

    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),
}

impl SyncError {
    pub fn is_not_tracked(&self) -> bool {
        matches!(self, SyncError::NotTracked(_))
    }

    pub fn is_not_connected(&self) -> bool {
        matches!(self, SyncError::NotConnected)
    }

    /// The document this error concerns, if any (used to populate
    /// `onError`'s `docId` field).
    pub fn doc_id(&self) -> Option<&DocId> {
        match self {
            SyncError::NotTracked(id)
            | SyncError::FlushFailed { doc_id: id, .. }
            | SyncError::SyncFailed { doc_id: id, .. } => Some(id),
            _ => None,
        }
    }
}
