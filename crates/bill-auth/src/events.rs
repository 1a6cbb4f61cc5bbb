//! Typed credential change notifications
//!
//! Every set/clear on the token store emits a `TokenEvent` to all subscribed
//! listeners. A panicking listener is caught and logged so it cannot prevent
//! later listeners from running.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// What happened to the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
    Set,
    Clear,
}

/// Credential change event delivered to listeners.
///
/// `token` carries the new credential on `Set` and is `None` on `Clear`.
#[derive(Clone)]
pub struct TokenEvent {
    pub action: TokenAction,
    pub token: Option<String>,
}

impl fmt::Debug for TokenEvent {
    // The token text stays out of Debug output so events are safe to log
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEvent")
            .field("action", &self.action)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Handle for removing a subscribed listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&TokenEvent) + Send + Sync>;

/// Listener registry with per-listener failure isolation.
pub(crate) struct TokenEvents {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl TokenEvents {
    pub(crate) fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener; returns the id used to unsubscribe it.
    pub(crate) fn subscribe(
        &self,
        listener: impl Fn(&TokenEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub(crate) fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().expect("listener registry poisoned");
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Deliver an event to every listener, isolating panics per listener.
    pub(crate) fn emit(&self, event: &TokenEvent) {
        // Snapshot under the lock, invoke outside it, so listeners may
        // subscribe/unsubscribe from inside a callback
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .expect("listener registry poisoned")
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| (*listener)(event))).is_err() {
                warn!("token listener panicked, continuing with remaining listeners");
            }
        }
    }
}
