//! # patches-manager
//!
//! The doc manager (§4.3): owns the tracked set, lazily opens and closes
//! replicas with idempotent concurrent `openDoc`, and fans out the four
//! signals the sync engine reacts to.

mod error;
mod events;
mod manager;

pub use error::{ManagerError, ManagerResult};
pub use events::ManagerEvent;
pub use manager::Patches;
