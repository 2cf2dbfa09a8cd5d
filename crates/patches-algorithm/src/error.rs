//! Errors raised by the pure algorithm layer.

use thiserror::Error;

/// Result type for algorithm operations.
pub type AlgorithmResult<T> = Result<T, AlgorithmError>;

/// Errors the algorithm strategy can raise.
///
/// The kernel is pure: these are all structural/logical failures (a
/// malformed operation, a path that doesn't resolve), never IO or
/// concurrency errors.
#[derive(Debug, Error, PartialEq)]
pub enum AlgorithmError {
    /// An operation referenced a path segment that doesn't exist in the
    /// target document (e.g. replacing a key of a non-object).
    #[error("path not found: {0:?}")]
    PathNotFound(String),

    /// An operation's `path` pointed through a value of the wrong shape
    /// (e.g. an array index into an object).
    #[error("type mismatch applying {op} at {path}")]
    TypeMismatch { op: String, path: String },

    /// An array index was out of bounds for an `add`/`remove`/`move`.
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// `ops` was empty where the contract requires at least one operation.
    #[error("operation list must be non-empty")]
    EmptyOps,

    /// A `test` operation's expected value did not match the actual value.
    #[error("test operation failed at {0}")]
    TestFailed(String),

    /// The rebase precondition (`serverChanges[0].baseRev == committedRev`)
    /// did not hold.
    #[error("rebase precondition violated: {0}")]
    InvalidRebase(String),

    /// An operation used a tag the strategy does not know how to apply
    /// structurally; it is preserved opaquely but cannot be interpreted.
    #[error("unrecognised operation tag: {0}")]
    UnknownTag(String),
}
