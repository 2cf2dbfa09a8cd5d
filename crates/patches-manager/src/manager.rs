//! [`Patches`]: the doc manager (§4.3).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use patches_algorithm::{Strategy, strategy_for};
use patches_doc::{Document, MutationKind};
use patches_store::Store;
use patches_types::{AlgorithmKind, Clock, DocId, Snapshot, SystemClock, TrackedDoc};
use serde_json::Value;
use tokio::sync::{OnceCell, broadcast};
use tokio::task::JoinHandle;

use crate::error::ManagerResult;
use crate::events::ManagerEvent;

struct OpenDoc {
    document: Arc<Document>,
    persistence_task: JoinHandle<()>,
}

/// Owns the tracked set and every currently-open [`Document`] replica.
/// `openDoc` is idempotent: concurrent callers for the same id share one
/// load, via a [`OnceCell`] installed in the registry before the load
/// starts.
pub struct Patches<S: Store + 'static> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    open: Mutex<HashMap<DocId, Arc<OnceCell<Arc<OpenDoc>>>>>,
    events: broadcast::Sender<ManagerEvent>,
}

impl<S: Store + 'static> Patches<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            store,
            clock,
            open: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Subscribes to `onTrackDocs`/`onUntrackDocs`/`onDeleteDoc`/`onChange`,
    /// delivered in emission order as one tagged stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.events.subscribe()
    }

    pub async fn track_docs(&self, ids: Vec<DocId>, algorithm: Option<AlgorithmKind>) -> ManagerResult<()> {
        self.store.track_docs(&ids, algorithm).await?;
        let _ = self.events.send(ManagerEvent::TrackDocs(ids));
        Ok(())
    }

    /// Untracking a doc whose replica is open closes the replica first,
    /// then removes it from the store.
    pub async fn untrack_docs(&self, ids: Vec<DocId>) -> ManagerResult<()> {
        for id in &ids {
            self.close_doc(id).await;
        }
        self.store.untrack_docs(&ids).await?;
        let _ = self.events.send(ManagerEvent::UntrackDocs(ids));
        Ok(())
    }

    /// Marks a tombstone in the store and closes any open replica. Does
    /// not untrack: the tombstone remains tracked until the sync engine's
    /// `confirmDeleteDoc` removes it entirely.
    pub async fn delete_doc(&self, id: DocId) -> ManagerResult<()> {
        self.store.delete_doc(&id).await?;
        self.close_doc(&id).await;
        let _ = self.events.send(ManagerEvent::DeleteDoc(id));
        Ok(())
    }

    pub async fn list_docs(&self, include_deleted: bool) -> ManagerResult<Vec<TrackedDoc>> {
        Ok(self.store.list_docs(include_deleted).await?)
    }

    /// Opens (or returns the already-open) replica for `id`.
    pub async fn open_doc(&self, id: DocId) -> ManagerResult<Arc<Document>> {
        let cell = {
            let mut open = self.open.lock();
            open.entry(id.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        let open_doc = cell.get_or_try_init(|| self.load_doc(id)).await?;
        Ok(open_doc.document.clone())
    }

    /// Reads a document's full state straight from the store: base state,
    /// revision, and any pending changes, bypassing the open-replica cache.
    /// Useful for taking a snapshot to ship elsewhere (§8 P5) without
    /// forcing the document open.
    pub async fn export_snapshot(&self, id: &DocId) -> ManagerResult<Option<Snapshot>> {
        Ok(self.store.get_doc(id).await?)
    }

    /// Restores a document's base state/revision and pending queue from a
    /// snapshot obtained via [`Patches::export_snapshot`]. If the replica
    /// is open, it is re-imported in place; otherwise only the store is
    /// updated and the next `openDoc` picks it up.
    pub async fn import_snapshot(&self, id: &DocId, snapshot: Snapshot) -> ManagerResult<()> {
        self.store.save_doc(id, snapshot.state.clone(), snapshot.rev).await?;
        self.store.save_pending_changes(id, snapshot.changes.clone()).await?;

        if let Some(document) = self.try_get_open(id) {
            document.import(snapshot)?;
        }
        Ok(())
    }

    /// Returns the replica for `id` only if it is already open; unlike
    /// [`Patches::open_doc`], never triggers a load. Used by the sync
    /// engine to decide between its fast path (update an open replica
    /// directly) and leaving a closed document's persisted state alone.
    pub fn try_get_open(&self, id: &DocId) -> Option<Arc<Document>> {
        let open = self.open.lock();
        open.get(id)?.get().map(|open_doc| open_doc.document.clone())
    }

    async fn load_doc(&self, id: DocId) -> ManagerResult<Arc<OpenDoc>> {
        let snapshot = self
            .store
            .get_doc(&id)
            .await?
            .unwrap_or_else(|| Snapshot::new(Value::Null, patches_types::Rev::PENDING));

        let tracked = self.store.list_docs(true).await?;
        let algorithm = tracked
            .iter()
            .find(|doc| doc.doc_id == id)
            .and_then(|doc| doc.algorithm)
            .unwrap_or_default();
        let strategy: Arc<dyn Strategy> = Arc::from(strategy_for(algorithm));

        let document = Arc::new(Document::new(id.clone(), strategy, self.clock.clone(), snapshot));
        let persistence_task = self.spawn_persistence_task(id, document.clone());

        Ok(Arc::new(OpenDoc {
            document,
            persistence_task,
        }))
    }

    /// Every local mutation gets persisted to the store and re-emitted as
    /// `onChange`; this is the subscription §4.3 says `openDoc` installs.
    fn spawn_persistence_task(&self, id: DocId, document: Arc<Document>) -> JoinHandle<()> {
        let mut mutations = document.subscribe();
        let store = self.store.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            loop {
                match mutations.recv().await {
                    Ok(mutation) if mutation.kind == MutationKind::Local => {
                        let pending = document.pending();
                        if let Err(error) = store.save_pending_changes(&id, pending).await {
                            tracing::error!(%error, doc_id = %id, "failed to persist pending change");
                        }
                        let _ = events.send(ManagerEvent::Change(id.clone()));
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Closes the replica for `id` if open; a no-op otherwise.
    pub async fn close_doc(&self, id: &DocId) {
        let cell = self.open.lock().remove(id);
        if let Some(cell) = cell {
            if let Some(open_doc) = cell.get() {
                open_doc.document.close();
                open_doc.persistence_task.abort();
            }
        }
    }
}
