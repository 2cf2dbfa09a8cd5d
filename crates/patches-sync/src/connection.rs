//! The connection lifecycle observable (§4.4.1): `{online, connected,
//! syncing}`, where `syncing` is `idle | initial | updating | error`.

/// Where the one transport connection this engine owns currently sits.
/// The concrete byte transport's own handshake (TLS, WebSocket upgrade,
/// reconnect backoff of *its* socket) is outside this crate's scope; the
/// embedder reports transitions via [`crate::PatchesSync::mark_connecting`]
/// and friends as its transport actually connects and disconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// The engine's own sync activity, independent of the raw connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncingState {
    /// No resync in flight.
    Idle,
    /// The very first resync since this engine was created.
    Initial,
    /// A resync triggered by reconnection or an explicit `syncAllKnown`.
    Updating,
    Error(String),
}

/// The public `{online, connected, syncing}` triple callers observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionObservable {
    pub online: bool,
    pub connected: bool,
    pub syncing: SyncingState,
}
