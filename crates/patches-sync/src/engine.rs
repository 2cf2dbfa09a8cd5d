//! [`PatchesSync`]: the sync engine (§4.4).
//!
//! Reacts to four inputs — connection state changes, the doc manager's
//! track/untrack/delete/change signals, server push notifications, and
//! online-state transitions — and drives two outputs: the `synced` map
//! and the `onError` stream. Per-document work (`syncDoc`/`flushDoc`) is
//! serialized behind a lock keyed by document id: at most one in-flight
//! sync per document, concurrent elsewhere.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use patches_doc::Document;
use patches_manager::{ManagerEvent, Patches};
use patches_store::Store;
use patches_transport::{Transport, break_into_batches};
use patches_types::{Change, DocId, Rev, Snapshot, SyncStatus, SyncedEntry};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::connection::{ConnectionObservable, ConnectionState, SyncingState};
use crate::error::{SyncError, SyncResult};
use crate::events::{SyncErrorEvent, SyncEvent};
use crate::online::OnlineState;
use crate::rpc::SyncTransport;
use crate::subscribe_filter::SubscribeFilter;
use crate::synced::SyncedMap;

struct EngineState {
    connection: ConnectionState,
    online: bool,
    syncing: SyncingState,
    has_synced_once: bool,
    tracked: HashSet<DocId>,
    subscribed_endpoints: HashSet<DocId>,
    presync_status: HashMap<DocId, SyncStatus>,
    /// Batches currently in flight for a `commitChanges` call, keyed by
    /// doc id; empty unless a flush is outstanding for that doc.
    in_flight: HashMap<DocId, Vec<Change>>,
    subscribe_filter: Option<Arc<dyn SubscribeFilter>>,
    connect_generation: u64,
}

/// The sync engine. Generic over the store and the byte-level transport so
/// embedders can plug in whatever persistence and wire implementations
/// they own; the engine itself never constructs either.
pub struct PatchesSync<S: Store + 'static, T: Transport + ?Sized + 'static> {
    manager: Arc<Patches<S>>,
    store: Arc<S>,
    transport: Arc<SyncTransport<T>>,
    online: Arc<dyn OnlineState>,
    config: SyncConfig,
    state: Mutex<EngineState>,
    synced: Mutex<SyncedMap>,
    doc_locks: Mutex<HashMap<DocId, Arc<tokio::sync::Mutex<()>>>>,
    events: broadcast::Sender<SyncEvent>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: Store + 'static, T: Transport + ?Sized + 'static> PatchesSync<S, T> {
    pub fn new(
        manager: Arc<Patches<S>>,
        store: Arc<S>,
        transport: Arc<SyncTransport<T>>,
        online: Arc<dyn OnlineState>,
        config: SyncConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let is_online_now = online.is_online();

        let engine = Arc::new(Self {
            manager: manager.clone(),
            store,
            transport,
            online: online.clone(),
            config,
            state: Mutex::new(EngineState {
                connection: ConnectionState::Disconnected,
                online: is_online_now,
                syncing: SyncingState::Idle,
                has_synced_once: false,
                tracked: HashSet::new(),
                subscribed_endpoints: HashSet::new(),
                presync_status: HashMap::new(),
                in_flight: HashMap::new(),
                subscribe_filter: None,
                connect_generation: 0,
            }),
            synced: Mutex::new(SyncedMap::default()),
            doc_locks: Mutex::new(HashMap::new()),
            events,
            background: Mutex::new(Vec::new()),
        });

        engine.spawn_background_tasks(manager, online);
        engine
    }

    fn spawn_background_tasks(self: &Arc<Self>, manager: Arc<Patches<S>>, online: Arc<dyn OnlineState>) {
        let mut tasks = self.background.lock();

        let engine = self.clone();
        let mut manager_events = manager.subscribe();
        tasks.push(tokio::spawn(async move {
            loop {
                match manager_events.recv().await {
                    Ok(event) => engine.handle_manager_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));

        let engine = self.clone();
        let mut online_changes = online.subscribe();
        tasks.push(tokio::spawn(async move {
            loop {
                match online_changes.recv().await {
                    Ok(is_online) => engine.set_online(is_online),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));

        let engine = self.clone();
        let mut committed = self.transport.changes_committed();
        tasks.push(tokio::spawn(async move {
            loop {
                match committed.recv().await {
                    Ok(value) => engine.handle_changes_committed_push(value).await,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));

        let engine = self.clone();
        let mut deleted = self.transport.doc_deleted();
        tasks.push(tokio::spawn(async move {
            loop {
                match deleted.recv().await {
                    Ok(value) => engine.handle_doc_deleted_push(value).await,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    // ---- Observables -----------------------------------------------------

    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn synced(&self) -> HashMap<DocId, SyncedEntry> {
        self.synced.lock().snapshot()
    }

    pub fn connection(&self) -> ConnectionObservable {
        let state = self.state.lock();
        ConnectionObservable {
            online: state.online,
            connected: state.connection == ConnectionState::Connected,
            syncing: state.syncing.clone(),
        }
    }

    pub fn set_subscribe_filter(&self, filter: Arc<dyn SubscribeFilter>) {
        self.state.lock().subscribe_filter = Some(filter);
    }

    // ---- Connection lifecycle (§4.4.1), driven by the embedder ------------

    pub fn mark_connecting(self: &Arc<Self>) {
        self.state.lock().connection = ConnectionState::Connecting;
        self.emit_connection_change();
    }

    /// Call once the underlying transport connection is up. Schedules
    /// `syncAllKnown` after the configured reconnect debounce (§5); a
    /// disconnect that lands inside the debounce window cancels it.
    pub fn mark_connected(self: &Arc<Self>) {
        let generation = {
            let mut state = self.state.lock();
            state.connection = ConnectionState::Connected;
            state.connect_generation += 1;
            state.connect_generation
        };
        self.emit_connection_change();

        let engine = self.clone();
        let debounce = self.config.reconnect_debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if engine.state.lock().connect_generation == generation {
                engine.sync_all_known().await;
            }
        });
    }

    /// Call when the underlying transport connection drops. Per-doc
    /// statuses that were mid-sync reset to `synced` if no pending
    /// changes remain, or back to their pre-sync value otherwise.
    pub fn mark_disconnected(self: &Arc<Self>) {
        let to_reset: Vec<(DocId, SyncStatus)> = {
            let state = self.state.lock();
            let synced = self.synced.lock();
            synced
                .ids_with_status(SyncStatus::Syncing)
                .into_iter()
                .map(|id| {
                    let presync = state.presync_status.get(&id).copied().unwrap_or(SyncStatus::Unsynced);
                    (id, presync)
                })
                .collect()
        };
        {
            let mut state = self.state.lock();
            state.connection = ConnectionState::Disconnected;
            state.syncing = SyncingState::Idle;
            // A fresh transport connection has no server-side subscription
            // state, so the next `reconcile_subscriptions` (driven by
            // `sync_all_known` on reconnect, §4.4.4) must treat every
            // tracked endpoint as needing a fresh `subscribe` call.
            state.subscribed_endpoints.clear();
        }

        let engine = self.clone();
        tokio::spawn(async move {
            for (id, presync) in to_reset {
                let has_pending = engine
                    .store
                    .get_pending_changes(&id)
                    .await
                    .map(|p| !p.is_empty())
                    .unwrap_or(false);
                let status = if has_pending { presync } else { SyncStatus::Synced };
                engine.set_synced_status_only(&id, status);
            }
            engine.emit_connection_change();
        });
    }

    pub fn mark_error(self: &Arc<Self>, message: impl Into<String>) {
        let message = message.into();
        {
            let mut state = self.state.lock();
            state.connection = ConnectionState::Error;
            state.syncing = SyncingState::Error(message);
        }
        self.emit_connection_change();
    }

    fn set_online(self: &Arc<Self>, is_online: bool) {
        {
            let mut state = self.state.lock();
            if state.online == is_online {
                return;
            }
            state.online = is_online;
        }
        self.emit_connection_change();
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connection == ConnectionState::Connected
    }

    fn is_tracked(&self, id: &DocId) -> bool {
        self.state.lock().tracked.contains(id)
    }

    fn emit_connection_change(&self) {
        let observable = self.connection();
        let _ = self.events.send(SyncEvent::ConnectionChange(observable));
    }

    // ---- Global resync (§4.4.4) -------------------------------------------

    pub async fn sync_all_known(self: &Arc<Self>) {
        let is_first = {
            let mut state = self.state.lock();
            let first = !state.has_synced_once;
            state.syncing = if first { SyncingState::Initial } else { SyncingState::Updating };
            first
        };
        self.emit_connection_change();

        let tracked_docs = match self.store.list_docs(true).await {
            Ok(docs) => docs,
            Err(error) => {
                self.report_error(None, error.into());
                self.finish_global_sync(is_first);
                return;
            }
        };

        let (deleted, active): (Vec<_>, Vec<_>) = tracked_docs.into_iter().partition(|doc| doc.deleted);

        {
            let mut state = self.state.lock();
            state.tracked = active
                .iter()
                .chain(deleted.iter())
                .map(|doc| doc.doc_id.clone())
                .collect();
        }
        self.reconcile_subscriptions().await;

        for doc in deleted {
            self.delete_on_transport(doc.doc_id).await;
        }

        let handles: Vec<_> = active
            .into_iter()
            .map(|doc| {
                let engine = self.clone();
                tokio::spawn(async move { engine.sync_doc(doc.doc_id).await })
            })
            .collect();
        for handle in handles {
            let _ = handle.await;
        }

        self.finish_global_sync(is_first);
    }

    fn finish_global_sync(&self, was_first: bool) {
        let mut state = self.state.lock();
        if matches!(state.syncing, SyncingState::Initial | SyncingState::Updating) {
            state.syncing = SyncingState::Idle;
        }
        state.has_synced_once = state.has_synced_once || was_first;
        drop(state);
        self.emit_connection_change();
    }

    async fn delete_on_transport(self: &Arc<Self>, id: DocId) {
        match self.transport.delete_doc(&id).await {
            Ok(()) => {
                let _ = self.store.confirm_delete_doc(&id).await;
                self.set_synced(id, None);
            }
            Err(error) => self.report_error(Some(id), error.into()),
        }
    }

    // ---- Tracking and subscription (§4.4.2) -------------------------------

    async fn handle_manager_event(self: &Arc<Self>, event: ManagerEvent) {
        match event {
            ManagerEvent::TrackDocs(ids) => self.on_track_docs(ids).await,
            ManagerEvent::UntrackDocs(ids) => self.on_untrack_docs(ids).await,
            ManagerEvent::DeleteDoc(id) => self.on_delete_doc_local(id).await,
            ManagerEvent::Change(id) => {
                if self.is_connected() {
                    self.spawn_sync_doc(id);
                }
            }
        }
    }

    async fn on_track_docs(self: &Arc<Self>, ids: Vec<DocId>) {
        let new_ids: Vec<DocId> = {
            let mut state = self.state.lock();
            ids.into_iter().filter(|id| state.tracked.insert(id.clone())).collect()
        };
        if new_ids.is_empty() {
            return;
        }
        if self.is_connected() {
            self.reconcile_subscriptions().await;
        }
        for id in new_ids {
            self.spawn_sync_doc(id);
        }
    }

    async fn on_untrack_docs(self: &Arc<Self>, ids: Vec<DocId>) {
        {
            let mut state = self.state.lock();
            for id in &ids {
                state.tracked.remove(id);
            }
        }
        for id in &ids {
            self.set_synced(id.clone(), None);
        }
        if self.is_connected() {
            self.reconcile_subscriptions().await;
        }
    }

    async fn on_delete_doc_local(self: &Arc<Self>, id: DocId) {
        self.state.lock().tracked.remove(&id);
        if self.is_connected() {
            self.delete_on_transport(id).await;
        }
        // Offline: the tombstone stays tracked in the store and the next
        // `syncAllKnown` sweep (§4.4.4) retries it.
    }

    /// Recomputes the desired subscription endpoints over the full tracked
    /// set and issues whatever `subscribe`/`unsubscribe` calls are needed
    /// to converge.
    async fn reconcile_subscriptions(self: &Arc<Self>) {
        let (desired, previous): (HashSet<DocId>, HashSet<DocId>) = {
            let state = self.state.lock();
            let tracked: Vec<DocId> = state.tracked.iter().cloned().collect();
            let desired = match &state.subscribe_filter {
                Some(filter) => filter.endpoints(&tracked).into_iter().collect(),
                None => tracked.into_iter().collect(),
            };
            (desired, state.subscribed_endpoints.clone())
        };

        let to_add: Vec<DocId> = desired.difference(&previous).cloned().collect();
        let to_remove: Vec<DocId> = previous.difference(&desired).cloned().collect();

        if !to_add.is_empty() {
            match self.transport.subscribe(&to_add).await {
                Ok(accepted) => {
                    let mut state = self.state.lock();
                    state.subscribed_endpoints.extend(accepted);
                }
                Err(error) => self.report_error(None, error.into()),
            }
        }
        if !to_remove.is_empty() {
            match self.transport.unsubscribe(&to_remove).await {
                Ok(()) => {
                    let mut state = self.state.lock();
                    for id in &to_remove {
                        state.subscribed_endpoints.remove(id);
                    }
                }
                Err(error) => self.report_error(None, error.into()),
            }
        }
    }

    // ---- Per-doc sync/flush (§4.4.3) --------------------------------------

    fn spawn_sync_doc(self: &Arc<Self>, id: DocId) {
        let engine = self.clone();
        tokio::spawn(async move { engine.sync_doc(id).await });
    }

    fn doc_lock(&self, id: &DocId) -> Arc<tokio::sync::Mutex<()>> {
        self.doc_locks
            .lock()
            .entry(id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Flushes any pending changes, then pulls whatever the server has
    /// that this replica doesn't. At most one `sync_doc` runs per id at a
    /// time; concurrent callers serialize on `doc_locks`.
    async fn sync_doc(self: &Arc<Self>, id: DocId) {
        let lock = self.doc_lock(&id);
        let _guard = lock.lock().await;

        if !self.is_connected() {
            return;
        }

        let presync = self.synced.lock().get(&id).map(|e| e.status).unwrap_or(SyncStatus::Unsynced);
        self.state.lock().presync_status.insert(id.clone(), presync);
        self.set_synced_status_only(&id, SyncStatus::Syncing);

        if let Err(error) = self.sync_doc_inner(&id).await {
            self.set_synced_status_only(&id, SyncStatus::Error);
            self.report_error(Some(id.clone()), error);
        }

        self.state.lock().presync_status.remove(&id);
    }

    async fn sync_doc_inner(self: &Arc<Self>, id: &DocId) -> SyncResult<()> {
        let pending = self.store.get_pending_changes(id).await?;
        if !pending.is_empty() {
            self.flush_doc(id, pending).await?;
        }

        let committed_rev = self.store.get_committed_rev(id).await?;
        if committed_rev.is_pending() {
            let snapshot = self
                .transport
                .get_doc(id, None)
                .await
                .map_err(|cause| SyncError::SyncFailed { doc_id: id.clone(), cause })?;
            self.import_full_snapshot(id, snapshot).await?;
        } else {
            let changes = self
                .transport
                .get_changes_since(id, committed_rev)
                .await
                .map_err(|cause| SyncError::SyncFailed { doc_id: id.clone(), cause })?;
            if changes.is_empty() {
                let pending_now = self.store.get_pending_changes(id).await?;
                self.set_synced(
                    id.clone(),
                    Some(SyncedEntry::new(committed_rev, !pending_now.is_empty(), SyncStatus::Synced)),
                );
            } else {
                self.ingest_server_changes(id, changes).await?;
                let pending_now = self.store.get_pending_changes(id).await?;
                let rev = self.store.get_committed_rev(id).await?;
                self.set_synced(id.clone(), Some(SyncedEntry::new(rev, !pending_now.is_empty(), SyncStatus::Synced)));
            }
        }
        Ok(())
    }

    async fn flush_doc(self: &Arc<Self>, id: &DocId, pending: Vec<Change>) -> SyncResult<()> {
        if !self.is_tracked(id) {
            return Err(SyncError::NotTracked(id.clone()));
        }
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }

        let batches = break_into_batches(&pending, self.config.max_payload_bytes);
        self.set_synced_has_pending(id, true);

        for batch in batches {
            self.state.lock().in_flight.insert(id.clone(), batch.clone());
            let commit_result = self.transport.commit_changes(id, &batch).await;

            match commit_result {
                Ok(committed) => {
                    self.ingest_server_changes(id, committed).await?;
                    self.state.lock().in_flight.remove(id);
                }
                // Leave `in_flight[id]` set on failure (§4.4.3 step 4): the
                // batch is still outstanding and will be replayed on the
                // next reconnect/sync rather than re-sent or dropped.
                Err(cause) => return Err(SyncError::FlushFailed { doc_id: id.clone(), cause }),
            }
        }
        Ok(())
    }

    async fn import_full_snapshot(self: &Arc<Self>, id: &DocId, snapshot: Snapshot) -> SyncResult<()> {
        self.store.save_doc(id, snapshot.state.clone(), snapshot.rev).await?;
        let pending = self.store.get_pending_changes(id).await?;

        if let Some(document) = self.manager.try_get_open(id) {
            let imported = Snapshot::new(snapshot.state, snapshot.rev).with_pending(pending.clone());
            if let Err(error) = document.import(imported) {
                tracing::warn!(doc_id = %id, %error, "replica import of full snapshot failed");
            }
        }

        let status = if snapshot.rev.is_pending() { SyncStatus::Unsynced } else { SyncStatus::Synced };
        self.set_synced(id.clone(), Some(SyncedEntry::new(snapshot.rev, !pending.is_empty(), status)));
        Ok(())
    }

    /// Shared entry point for both paths that deliver server changes to a
    /// doc (§4.4.6): a transport push notification, and a flush RPC's own
    /// response. Own confirmed batches naturally rebase to nothing *the
    /// first time they're delivered*, since the matching pending entries
    /// transform away against the changes that just committed them — but
    /// §4.5 leaves originator exclusion on `changesCommitted` optional, so
    /// a batch already applied via its `commitChanges` response can be
    /// re-delivered as a push. Changes at or below the current
    /// `committedRev` are dropped before rebase/apply (I1/I5) so a
    /// duplicate delivery is a no-op instead of double-applying ops like
    /// `@inc` or array `add` against an already-advanced base state.
    async fn ingest_server_changes(self: &Arc<Self>, id: &DocId, server_changes: Vec<Change>) -> SyncResult<()> {
        if server_changes.is_empty() {
            return Ok(());
        }

        let committed_rev = self.store.get_committed_rev(id).await?;
        let server_changes: Vec<Change> =
            server_changes.into_iter().filter(|change| change.rev > committed_rev).collect();
        if server_changes.is_empty() {
            return Ok(());
        }

        let snapshot = self.store.get_doc(id).await?.ok_or_else(|| SyncError::NotTracked(id.clone()))?;
        let strategy = self.strategy_for(id).await?;
        let (new_pending, _state) = strategy.rebase(&snapshot.changes, &server_changes, &snapshot.state)?;

        self.store.apply_server_changes(id, &server_changes, new_pending.clone()).await?;

        if let Some(document) = self.manager.try_get_open(id) {
            self.update_open_replica(id, &document, &server_changes, new_pending).await;
        }

        let rev = server_changes.last().map(|c| c.rev);
        self.bump_synced_committed_rev(id, rev).await;
        Ok(())
    }

    /// Fast path: apply `server_changes` directly if the replica's
    /// `committedRev` matches what they continue from. Otherwise the
    /// replica has drifted (e.g. it was closed through part of this);
    /// slow path: re-import from the store's just-updated state. If
    /// either application itself errors (an algorithm bug), force a full
    /// resync from the transport (§7).
    async fn update_open_replica(
        self: &Arc<Self>,
        id: &DocId,
        document: &Arc<Document>,
        server_changes: &[Change],
        new_pending: Vec<Change>,
    ) {
        let expected_base = server_changes[0].base_rev;
        let result = if document.committed_rev() == expected_base {
            document.apply_committed_changes(server_changes, new_pending)
        } else {
            match self.store.get_doc(id).await {
                Ok(Some(refreshed)) => document.import(refreshed),
                Ok(None) => Ok(()),
                Err(error) => {
                    tracing::warn!(doc_id = %id, %error, "failed reading refreshed snapshot for drifted replica");
                    return;
                }
            }
        };

        if let Err(error) = result {
            tracing::warn!(doc_id = %id, %error, "replica application failed; forcing full resync");
            self.force_full_resync(id, document).await;
        }
    }

    async fn force_full_resync(self: &Arc<Self>, id: &DocId, document: &Arc<Document>) {
        match self.transport.get_doc(id, None).await {
            Ok(snapshot) => {
                let _ = self.store.save_doc(id, snapshot.state.clone(), snapshot.rev).await;
                let _ = self.store.save_pending_changes(id, snapshot.changes.clone()).await;
                if let Err(error) = document.import(snapshot) {
                    tracing::error!(doc_id = %id, %error, "replica import failed even after forced resync");
                }
            }
            Err(error) => self.report_error(Some(id.clone()), error.into()),
        }
    }

    async fn strategy_for(&self, id: &DocId) -> SyncResult<Box<dyn patches_algorithm::Strategy>> {
        let tracked = self.store.list_docs(true).await?;
        let algorithm = tracked
            .iter()
            .find(|doc| &doc.doc_id == id)
            .and_then(|doc| doc.algorithm)
            .unwrap_or_default();
        Ok(patches_algorithm::strategy_for(algorithm))
    }

    async fn bump_synced_committed_rev(self: &Arc<Self>, id: &DocId, rev: Option<Rev>) {
        let Some(rev) = rev else { return };
        let pending = self.store.get_pending_changes(id).await.unwrap_or_default();
        let status = self.synced.lock().get(id).map(|e| e.status).unwrap_or(SyncStatus::Synced);
        self.set_synced(id.clone(), Some(SyncedEntry::new(rev, !pending.is_empty(), status)));
    }

    // ---- Remote deletion (§4.4.7) ------------------------------------------

    async fn handle_doc_deleted_push(self: &Arc<Self>, value: serde_json::Value) {
        let notification: crate::rpc::DocDeletedNotification = match serde_json::from_value(value) {
            Ok(n) => n,
            Err(error) => {
                tracing::warn!(%error, "unparseable docDeleted notification");
                return;
            }
        };
        self.manager.close_doc(&notification.doc_id).await;
        self.state.lock().tracked.remove(&notification.doc_id);
        let _ = self.store.confirm_delete_doc(&notification.doc_id).await;
        self.set_synced(notification.doc_id, None);
    }

    async fn handle_changes_committed_push(self: &Arc<Self>, value: serde_json::Value) {
        let notification: crate::rpc::ChangesCommittedNotification = match serde_json::from_value(value) {
            Ok(n) => n,
            Err(error) => {
                tracing::warn!(%error, "unparseable changesCommitted notification");
                return;
            }
        };
        if let Err(error) = self.ingest_server_changes(&notification.doc_id, notification.changes).await {
            self.report_error(Some(notification.doc_id), error);
        }
    }

    // ---- Synced-map helpers -------------------------------------------------

    fn set_synced(&self, id: DocId, patch: Option<SyncedEntry>) {
        let changed = self.synced.lock().update(id, patch);
        if changed {
            self.emit_synced_change();
        }
    }

    fn set_synced_status_only(&self, id: &DocId, status: SyncStatus) {
        let current = self.synced.lock().get(id);
        let entry = match current {
            Some(mut e) => {
                e.status = status;
                e
            }
            None => SyncedEntry::new(Rev::PENDING, false, status),
        };
        self.set_synced(id.clone(), Some(entry));
    }

    fn set_synced_has_pending(&self, id: &DocId, has_pending: bool) {
        let current = self.synced.lock().get(id);
        let entry = match current {
            Some(mut e) => {
                e.has_pending = has_pending;
                e
            }
            None => SyncedEntry::new(Rev::PENDING, has_pending, SyncStatus::Syncing),
        };
        self.set_synced(id.clone(), Some(entry));
    }

    fn emit_synced_change(&self) {
        let snapshot = self.synced.lock().snapshot();
        let _ = self.events.send(SyncEvent::SyncedChange(Arc::new(snapshot)));
    }

    fn report_error(&self, doc_id: Option<DocId>, error: SyncError) {
        let doc_id = doc_id.or_else(|| error.doc_id().cloned());
        tracing::error!(?doc_id, %error, "sync error");
        let _ = self.events.send(SyncEvent::Error(SyncErrorEvent { doc_id, message: error.to_string() }));
    }

    // ---- Shutdown (§5) --------------------------------------------------------

    /// Stops accepting new work conceptually (callers should stop driving
    /// this engine after calling this), lets in-flight RPCs settle for the
    /// configured grace period, then aborts background listeners.
    pub async fn shutdown(&self) {
        self.transport.shutdown(self.config.shutdown_grace).await;
        for handle in self.background.lock().drain(..) {
            handle.abort();
        }
    }

    /// Batches currently outstanding for `id`, if a flush is in progress.
    pub fn in_flight(&self, id: &DocId) -> Option<Vec<Change>> {
        self.state.lock().in_flight.get(id).cloned()
    }
}
