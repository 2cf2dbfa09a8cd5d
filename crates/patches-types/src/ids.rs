//! Identifiers shared across the patches data model.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identifier of a tracked document.
///
/// Document ids are opaque strings chosen by the caller. A hierarchical
/// [`subscribeFilter`](crate) may interpret `/`-separated segments as a
/// root/sub-document relationship (see the sync engine's subscription
/// reduction), but the core itself treats the id as an uninterpreted key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for DocId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A globally unique, client-generated identifier for a [`Change`](crate::Change).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(Uuid);

impl ChangeId {
    /// Generates a fresh, random change id.
    ///
    /// Callers needing deterministic ids in tests should use
    /// [`ChangeId::from_uuid`] with a fixed [`Uuid`] instead.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A server-assigned revision number.
///
/// `0` is reserved for "pending" (a change that has not yet been
/// committed). Committed revisions form the strictly increasing sequence
/// `1, 2, 3, …` per document (spec invariant: committed revisions are
/// strictly monotonic per document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rev(u64);

impl Rev {
    pub const PENDING: Rev = Rev(0);

    pub const fn new(rev: u64) -> Self {
        Self(rev)
    }

    pub const fn is_pending(self) -> bool {
        self.0 == 0
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Rev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for Rev {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// An optional grouping marker stamped onto [`Change`](crate::Change)s that were
/// split to honour the transport's payload budget (see `break_into_batches`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
