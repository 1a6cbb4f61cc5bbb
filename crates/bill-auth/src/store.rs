//! Credential storage with durable slot + in-memory mirror
//!
//! The durable storage slot (key `token`) is the source of truth; an
//! in-memory mirror keeps the credential available when storage reads fail
//! and lets the two sides reconcile: whichever side holds a structurally
//! valid token is copied into the other. Malformed tokens never reach
//! storage, and an expired credential is destroyed on first detection.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use common::DurableKv;
use serde_json::Value;
use tracing::{debug, warn};

use crate::events::{ListenerId, TokenAction, TokenEvent, TokenEvents};
use crate::token;

/// Durable storage key holding the raw bearer string.
pub const TOKEN_KEY: &str = "token";

/// Owns the client's bearer credential.
///
/// All credential writes go through `set`/`clear`; no other component
/// mutates the durable slot or the mirror directly.
pub struct TokenStore {
    storage: std::sync::Arc<DurableKv>,
    mirror: Mutex<Option<String>>,
    session_active: AtomicBool,
    events: TokenEvents,
}

impl TokenStore {
    /// Create a store over the given durable storage.
    ///
    /// Does not touch storage; call `get_valid` (or
    /// `SessionContext::initialize`) to resolve any persisted credential.
    pub fn new(storage: std::sync::Arc<DurableKv>) -> Self {
        Self {
            storage,
            mirror: Mutex::new(None),
            session_active: AtomicBool::new(false),
            events: TokenEvents::new(),
        }
    }

    /// Resolve the current credential without an expiry check.
    ///
    /// Reads the durable slot first; a structurally valid stored token is
    /// mirrored into memory and marks the session active. Otherwise a
    /// structurally valid mirrored token is written back to the slot. If
    /// neither side holds a usable token the store is cleared and `None`
    /// is returned.
    pub async fn get(&self) -> Option<String> {
        if let Some(Value::String(stored)) = self.storage.get(TOKEN_KEY).await {
            if token::is_valid_format(&stored) {
                let mut mirror = self.mirror.lock().expect("token mirror poisoned");
                if mirror.as_deref() != Some(stored.as_str()) {
                    *mirror = Some(stored.clone());
                }
                drop(mirror);
                self.session_active.store(true, Ordering::Release);
                return Some(stored);
            }
        }

        let mirrored = self.mirror.lock().expect("token mirror poisoned").clone();
        if let Some(mirrored) = mirrored {
            if token::is_valid_format(&mirrored) {
                // Storage lost the token (or held garbage); restore it
                if let Err(e) = self
                    .storage
                    .set(TOKEN_KEY, Value::String(mirrored.clone()))
                    .await
                {
                    warn!(error = %e, "failed to write mirrored token back to storage");
                }
                return Some(mirrored);
            }
        }

        self.clear().await;
        None
    }

    /// Resolve the current credential, destroying it if expired.
    pub async fn get_valid(&self) -> Option<String> {
        let current = self.get().await?;
        if token::is_expired(&current) {
            warn!("token expired, clearing credential");
            self.clear().await;
            return None;
        }
        Some(current)
    }

    /// Store a new credential.
    ///
    /// Tokens failing structural validation are rejected: nothing is
    /// persisted and `false` is returned. On success the slot and mirror are
    /// updated, the session is marked active, and a `Set` event fires.
    pub async fn set(&self, new_token: &str) -> bool {
        if !token::is_valid_format(new_token) {
            warn!(len = new_token.len(), "rejected token with invalid format");
            return false;
        }

        if let Err(e) = self
            .storage
            .set(TOKEN_KEY, Value::String(new_token.to_string()))
            .await
        {
            // The mirror still carries the session; storage reconciles on the
            // next successful read
            warn!(error = %e, "failed to persist token");
        }
        *self.mirror.lock().expect("token mirror poisoned") = Some(new_token.to_string());
        self.session_active.store(true, Ordering::Release);

        self.events.emit(&TokenEvent {
            action: TokenAction::Set,
            token: Some(new_token.to_string()),
        });
        debug!("token updated");
        true
    }

    /// Destroy the credential: erase slot and mirror, mark the session
    /// inactive, and fire a `Clear` event.
    pub async fn clear(&self) {
        if let Err(e) = self.storage.remove(TOKEN_KEY).await {
            warn!(error = %e, "failed to remove token from storage");
        }
        *self.mirror.lock().expect("token mirror poisoned") = None;
        self.session_active.store(false, Ordering::Release);

        self.events.emit(&TokenEvent {
            action: TokenAction::Clear,
            token: None,
        });
        debug!("token cleared");
    }

    /// Drop the mirror and re-resolve from the durable slot.
    pub async fn refresh_from_storage(&self) -> Option<String> {
        *self.mirror.lock().expect("token mirror poisoned") = None;
        self.get().await
    }

    /// Whether a credential was accepted and not yet cleared.
    ///
    /// This is the process-wide login flag; components read it here instead
    /// of carrying their own copies.
    pub fn session_active(&self) -> bool {
        self.session_active.load(Ordering::Acquire)
    }

    /// Register a change listener. Fires on every `set`/`clear`.
    pub fn subscribe(
        &self,
        listener: impl Fn(&TokenEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.events.subscribe(listener)
    }

    /// Remove a previously registered listener.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }
}
