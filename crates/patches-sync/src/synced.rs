//! The denormalised `synced` map (§4.4.5): `updateSynced` semantics — a
//! `None` patch removes the entry, an unchanged patch emits nothing, and
//! every real change gets a fresh map snapshot broadcast to subscribers.

use std::collections::HashMap;

use patches_types::{DocId, SyncStatus, SyncedEntry};

#[derive(Debug, Default)]
pub(crate) struct SyncedMap {
    entries: HashMap<DocId, SyncedEntry>,
}

impl SyncedMap {
    pub fn snapshot(&self) -> HashMap<DocId, SyncedEntry> {
        self.entries.clone()
    }

    pub fn get(&self, id: &DocId) -> Option<SyncedEntry> {
        self.entries.get(id).cloned()
    }

    /// Applies `patch` for `id`; returns `true` if the map actually changed.
    pub fn update(&mut self, id: DocId, patch: Option<SyncedEntry>) -> bool {
        match patch {
            None => self.entries.remove(&id).is_some(),
            Some(entry) => {
                if self.entries.get(&id) == Some(&entry) {
                    false
                } else {
                    self.entries.insert(id, entry);
                    true
                }
            }
        }
    }

    pub fn ids_with_status(&self, status: SyncStatus) -> Vec<DocId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.status == status)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
