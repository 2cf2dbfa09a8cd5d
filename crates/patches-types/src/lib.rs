//! # patches-types
//!
//! Core value types shared by every layer of the patches sync core: the
//! [`Operation`]/[`Change`]/[`Snapshot`] data model, the [`TrackedDoc`]
//! persistent record and [`SyncedEntry`] observable projection, and the
//! [`Clock`] time source abstraction used to keep the algorithm layer pure.
//!
//! This crate has no IO and no async: it is the foundation layer the other
//! `patches-*` crates build on.

mod change;
mod clock;
mod ids;
mod operation;
mod snapshot;
mod tracked;

pub use change::{AlgorithmKind, Change};
pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{BatchId, ChangeId, DocId, Rev};
pub use operation::{Operation, Path, PathSegment, tag};
pub use snapshot::Snapshot;
pub use tracked::{SyncStatus, SyncedEntry, TrackedDoc};
