//! Response caching for the bill-tracking client
//!
//! Two layers with different lifetimes:
//!
//! - Durable cache records in the storage slot: `{data, written_at, ttl}`
//!   envelopes with lazy expiry on read and an opportunistic sweep at
//!   application start. A best-effort optimization, never a correctness
//!   dependency — every storage failure is logged and swallowed.
//! - An in-memory request memo for short-TTL deduplication of expensive
//!   calls, with stale-on-error fallback: if the producer fails and an old
//!   value exists, the old value wins over the failure.
//!
//! Cache keys are deterministic functions of the request identity and its
//! sorted parameter set, so semantically identical requests hit the same
//! entry regardless of parameter order.

pub mod key;
pub mod memo;
pub mod store;

pub use key::generate_key;
pub use store::{CacheRecord, CacheStore};
