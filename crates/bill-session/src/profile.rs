//! Cached profile fields
//!
//! Avatar, nickname and user id live in the durable slot under their own
//! keys, independent of the credential lifecycle — a cleared token does not
//! blank the profile, only an explicit logout does.

use common::DurableKv;
use serde_json::Value;
use tracing::warn;

pub const AVATAR_URL_KEY: &str = "avatarUrl";
pub const NICK_NAME_KEY: &str = "nickName";
pub const USER_ID_KEY: &str = "userId";

/// Locally cached profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub avatar_url: Option<String>,
    pub nick_name: Option<String>,
    pub user_id: Option<String>,
}

/// Load the cached profile. Missing or malformed fields read as `None`.
pub async fn load(storage: &DurableKv) -> UserProfile {
    UserProfile {
        avatar_url: read_string(storage, AVATAR_URL_KEY).await,
        nick_name: read_string(storage, NICK_NAME_KEY).await,
        user_id: read_string(storage, USER_ID_KEY).await,
    }
}

/// Persist the present fields. Best effort; failures are logged.
pub async fn save(storage: &DurableKv, profile: &UserProfile) {
    for (key, value) in [
        (AVATAR_URL_KEY, &profile.avatar_url),
        (NICK_NAME_KEY, &profile.nick_name),
        (USER_ID_KEY, &profile.user_id),
    ] {
        if let Some(value) = value {
            if let Err(e) = storage.set(key, Value::String(value.clone())).await {
                warn!(key, error = %e, "failed to persist profile field");
            }
        }
    }
}

/// Remove all cached profile fields (logout).
pub async fn clear(storage: &DurableKv) {
    for key in [AVATAR_URL_KEY, NICK_NAME_KEY, USER_ID_KEY] {
        if let Err(e) = storage.remove(key).await {
            warn!(key, error = %e, "failed to remove profile field");
        }
    }
}

async fn read_string(storage: &DurableKv, key: &str) -> Option<String> {
    match storage.get(key).await {
        Some(Value::String(value)) => Some(value),
        _ => None,
    }
}
