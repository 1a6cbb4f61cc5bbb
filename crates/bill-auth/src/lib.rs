//! Bearer credential lifecycle for the bill-tracking client
//!
//! Owns the single credential the client holds: structural validation,
//! advisory expiry checking against the unverified JWT payload, persistence
//! in the durable storage slot with an in-memory mirror, and typed change
//! notifications.
//!
//! Credential flow:
//! 1. Login completes and the session layer calls `TokenStore::set()`
//! 2. Requests read the credential via `TokenStore::get_valid()`
//! 3. Expiry detection, logout or a server 401 calls `TokenStore::clear()`
//! 4. Interested components observe changes via `TokenStore::subscribe()`
//!
//! Expiry checking here is advisory only — the payload signature is never
//! verified (meaningless client-side); a server-reported 401 remains the
//! authoritative invalidation signal.

pub mod error;
pub mod events;
pub mod store;
pub mod token;

pub use error::{Error, Result};
pub use events::{ListenerId, TokenAction, TokenEvent};
pub use store::TokenStore;
pub use token::{TokenInfo, is_expired, is_valid_format, token_info};
