//! Errors a [`crate::Document`] can raise.

use patches_algorithm::AlgorithmError;
use thiserror::Error;

pub type DocResult<T> = Result<T, DocError>;

#[derive(Debug, Error)]
pub enum DocError {
    /// The replica has been closed; no further mutation or import is
    /// accepted.
    #[error("document is closed")]
    Closed,

    /// The mutator produced an operation the bound strategy rejected.
    #[error("invalid operation: {0}")]
    InvalidOps(#[from] AlgorithmError),
}
