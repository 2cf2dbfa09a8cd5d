//! The platform online-state collaborator (§6.3): a single
//! process-provided observable of network reachability the engine
//! subscribes to and debounces reconnect-triggered resyncs against.
//!
//! Modelled as an injected collaborator rather than a process-wide
//! singleton; a real deployment supplies an impl reading the host OS
//! (`navigator.onLine`, `NetworkReachability`, …), and tests use
//! [`StaticOnlineState`] to drive transitions by hand.

use parking_lot::Mutex;
use tokio::sync::broadcast;

pub trait OnlineState: Send + Sync {
    fn is_online(&self) -> bool;

    /// Subscribes to online/offline transitions, delivered in emission order.
    fn subscribe(&self) -> broadcast::Receiver<bool>;
}

/// Always online, never changes. For callers that don't exercise
/// reconnection behaviour.
pub struct NullOnlineState {
    sender: broadcast::Sender<bool>,
}

impl NullOnlineState {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }
}

impl Default for NullOnlineState {
    fn default() -> Self {
        Self::new()
    }
}

impl OnlineState for NullOnlineState {
    fn is_online(&self) -> bool {
        true
    }

    fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// A manually-driven online-state test double: starts at a fixed value;
/// [`StaticOnlineState::set`] pushes a transition to every subscriber and
/// is a no-op if the value doesn't actually change.
pub struct StaticOnlineState {
    state: Mutex<bool>,
    sender: broadcast::Sender<bool>,
}

impl StaticOnlineState {
    pub fn new(initial: bool) -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { state: Mutex::new(initial), sender }
    }

    pub fn set(&self, online: bool) {
        let mut state = self.state.lock();
        if *state == online {
            return;
        }
        *state = online;
        let _ = self.sender.send(online);
    }
}

impl OnlineState for StaticOnlineState {
    fn is_online(&self) -> bool {
        *self.state.lock()
    }

    fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_online_state_skips_redundant_transitions() {
        let state = StaticOnlineState::new(true);
        let mut rx = state.subscribe();
        state.set(true);
        assert!(rx.try_recv().is_err());
        state.set(false);
        assert_eq!(rx.try_recv().unwrap(), false);
    }
}
