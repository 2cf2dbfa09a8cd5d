//! Engine-local configuration. For the layered, file/env-backed loader
//! used to produce values like these, see `patches-config`.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Transport payload budget passed to `break_into_batches` (§4.6).
    /// `None` disables batching.
    pub max_payload_bytes: Option<usize>,
    /// Debounce between a connection becoming `connected` and
    /// `syncAllKnown` running (§5): a fixed 300ms, not exponential
    /// backoff — see DESIGN.md.
    pub reconnect_debounce: Duration,
    /// Grace period in-flight RPCs get to settle on shutdown (§5) before
    /// being rejected with `Cancelled`.
    pub shutdown_grace: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: Some(64 * 1024),
            reconnect_debounce: Duration::from_millis(300),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}
