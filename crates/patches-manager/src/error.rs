//! Errors the doc manager can raise.

use patches_doc::DocError;
use patches_store::StoreError;
use thiserror::Error;

pub type ManagerResult<T> = Result<T, ManagerError>;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Doc(#[from] DocError),
}
