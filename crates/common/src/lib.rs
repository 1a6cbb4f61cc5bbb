//! Common types for the bill-tracking client core

mod error;
mod kv;
mod secret;

pub use error::{Error, Result};
pub use kv::DurableKv;
pub use secret::Secret;
