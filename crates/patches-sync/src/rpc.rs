//! Typed calls the sync engine makes over a [`patches_transport::RpcClient`]
//! (§6.2): `subscribe`, `unsubscribe`, `getDoc`, `getChangesSince`,
//! `commitChanges`, `deleteDoc`, plus the two server-initiated
//! notifications it listens for.

use std::sync::Arc;
use std::time::Duration;

use patches_transport::{RpcClient, Transport, TransportError, TransportResult};
use patches_types::{Change, DocId, Rev, Snapshot};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;

/// The `changesCommitted` push notification (§6.2): the server confirmed
/// changes on `doc_id`, originating from this session or another.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesCommittedNotification {
    pub doc_id: DocId,
    pub changes: Vec<Change>,
}

/// The `docDeleted` push notification (§6.2): another session deleted a
/// tracked document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocDeletedNotification {
    pub doc_id: DocId,
}

/// Wraps an [`RpcClient`] with the six typed methods the sync engine needs.
pub struct SyncTransport<T: Transport + ?Sized> {
    client: Arc<RpcClient<T>>,
}

impl<T: Transport + ?Sized> SyncTransport<T> {
    pub fn new(client: Arc<RpcClient<T>>) -> Self {
        Self { client }
    }

    pub async fn subscribe(&self, ids: &[DocId]) -> TransportResult<Vec<DocId>> {
        let result = self.client.call("subscribe", json!(ids)).await?;
        decode(result)
    }

    pub async fn unsubscribe(&self, ids: &[DocId]) -> TransportResult<()> {
        self.client.call("unsubscribe", json!(ids)).await?;
        Ok(())
    }

    pub async fn get_doc(&self, id: &DocId, at_rev: Option<Rev>) -> TransportResult<Snapshot> {
        let result = self.client.call("getDoc", json!({"id": id, "atRev": at_rev})).await?;
        decode(result)
    }

    pub async fn get_changes_since(&self, id: &DocId, rev: Rev) -> TransportResult<Vec<Change>> {
        let result = self
            .client
            .call("getChangesSince", json!({"id": id, "rev": rev}))
            .await?;
        decode(result)
    }

    pub async fn commit_changes(&self, id: &DocId, changes: &[Change]) -> TransportResult<Vec<Change>> {
        let result = self
            .client
            .call("commitChanges", json!({"id": id, "changes": changes}))
            .await?;
        decode(result)
    }

    pub async fn delete_doc(&self, id: &DocId) -> TransportResult<()> {
        self.client.call("deleteDoc", json!(id)).await?;
        Ok(())
    }

    /// Raw notification stream for `changesCommitted`; the engine parses
    /// each payload into a [`ChangesCommittedNotification`].
    pub fn changes_committed(&self) -> broadcast::Receiver<Value> {
        self.client.subscribe("changesCommitted")
    }

    /// Raw notification stream for `docDeleted`.
    pub fn doc_deleted(&self) -> broadcast::Receiver<Value> {
        self.client.subscribe("docDeleted")
    }

    pub async fn shutdown(&self, grace: Duration) {
        self.client.shutdown(grace).await;
    }
}

fn decode<D: for<'de> Deserialize<'de>>(value: Value) -> TransportResult<D> {
    serde_json::from_value(value).map_err(|source| TransportError::InvalidParams(source.to_string()))
}
