//! # patches-doc
//!
//! The in-memory document replica (§4.2): local change composition,
//! speculative state, and synchronous subscription to mutations. A
//! [`Document`] never calls into the store or sync engine directly — the
//! doc manager (`patches-manager`) owns that coupling.

mod document;
mod error;
mod mutation;

pub use document::Document;
pub use error::{DocError, DocResult};
pub use mutation::{DocMutation, MutationKind};
