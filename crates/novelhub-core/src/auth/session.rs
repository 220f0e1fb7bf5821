use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::GENERIC_FAILURE_MESSAGE;
use crate::models::LoginResponse;

use super::storage::SessionStore;
use super::AuthError;

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "token";

/// Storage key for the authenticated user's id
pub const USER_ID_KEY: &str = "userId";

/// Lifetime of a "remember me" session in days.
const DURABLE_EXPIRY_DAYS: i64 = 1;

/// How long a session outlives the current browsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    /// Kept for a fixed period, survives restarts
    Durable,
    /// Dropped when the browsing context ends
    Ephemeral,
}

impl Persistence {
    pub fn from_remember_me(remember_me: bool) -> Self {
        if remember_me {
            Persistence::Durable
        } else {
            Persistence::Ephemeral
        }
    }

    /// Expiry timestamp for entries written at `now`, `None` for session-scoped.
    pub fn expiry(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Persistence::Durable => Some(now + Duration::days(DURABLE_EXPIRY_DAYS)),
            Persistence::Ephemeral => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub persistence: Persistence,
}

impl Session {
    /// Build a session from a login response. Both `token` and `userId`
    /// must be present and non-empty.
    pub fn from_response(response: LoginResponse, persistence: Persistence) -> Result<Self, AuthError> {
        let token = response.token.filter(|t| !t.is_empty());
        let user_id = response.user_id.filter(|u| !u.is_empty());

        match (token, user_id) {
            (Some(token), Some(user_id)) => Ok(Self {
                token,
                user_id,
                persistence,
            }),
            _ => Err(AuthError::RequestFailed(GENERIC_FAILURE_MESSAGE.to_string())),
        }
    }
}

/// Write the session's two entries to `store`. Both land or neither does.
pub fn persist_session(store: &dyn SessionStore, session: &Session) -> anyhow::Result<()> {
    let expires_at = session.persistence.expiry(Utc::now());
    let written = store
        .set(TOKEN_KEY, &session.token, expires_at)
        .and_then(|_| store.set(USER_ID_KEY, &session.user_id, expires_at));

    if let Err(e) = written {
        if let Err(rollback) = clear_session(store) {
            warn!(error = %rollback, "Failed to roll back partial session write");
        }
        return Err(e);
    }
    Ok(())
}

/// Remove both session entries from `store`.
pub fn clear_session(store: &dyn SessionStore) -> anyhow::Result<()> {
    store.remove(TOKEN_KEY)?;
    store.remove(USER_ID_KEY)?;
    Ok(())
}
