use std::sync::{Arc, RwLock};

use anyhow::Result;
use tracing::{debug, info};

use super::session::{clear_session, TOKEN_KEY, USER_ID_KEY};
use super::storage::SessionStore;

/// The session as last read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub token: String,
    pub user_id: String,
}

/// Shared authentication state, passed explicitly to whatever needs it.
///
/// Storage is the source of truth; `reload` re-reads it after a login or
/// logout so every holder of the context sees the same session.
pub struct AuthContext {
    store: Arc<dyn SessionStore>,
    current: RwLock<Option<SessionSnapshot>>,
    google_client_id: Option<String>,
}

impl AuthContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let ctx = Self {
            store,
            current: RwLock::new(None),
            google_client_id: None,
        };
        ctx.reload();
        ctx
    }

    /// OAuth client id for front ends offering Google sign-in
    pub fn with_google_client_id(mut self, client_id: Option<String>) -> Self {
        self.google_client_id = client_id;
        self
    }

    pub fn google_client_id(&self) -> Option<&str> {
        self.google_client_id.as_deref()
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub fn current(&self) -> Option<SessionSnapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Re-read the session from storage. A session needs both entries.
    pub fn reload(&self) -> Option<SessionSnapshot> {
        let snapshot = match (self.store.get(TOKEN_KEY), self.store.get(USER_ID_KEY)) {
            (Some(token), Some(user_id)) => Some(SessionSnapshot { token, user_id }),
            _ => None,
        };
        debug!(authenticated = snapshot.is_some(), "Auth context reloaded");

        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = snapshot.clone();
        snapshot
    }

    /// Drop the stored session and forget it
    pub fn logout(&self) -> Result<()> {
        clear_session(self.store.as_ref())?;
        self.reload();
        info!("Logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::{persist_session, Persistence, Session};
    use crate::auth::storage::CookieJar;

    fn session() -> Session {
        Session {
            token: "abc".to_string(),
            user_id: "1".to_string(),
            persistence: Persistence::Ephemeral,
        }
    }

    #[test]
    fn test_new_context_reads_existing_session() {
        let jar = Arc::new(CookieJar::in_memory());
        persist_session(jar.as_ref(), &session()).unwrap();

        let ctx = AuthContext::new(jar);
        assert_eq!(
            ctx.current(),
            Some(SessionSnapshot {
                token: "abc".to_string(),
                user_id: "1".to_string()
            })
        );
    }

    #[test]
    fn test_reload_picks_up_new_session() {
        let ctx = AuthContext::new(Arc::new(CookieJar::in_memory()));
        assert!(!ctx.is_authenticated());

        persist_session(ctx.store(), &session()).unwrap();
        // Not visible until reloaded
        assert!(!ctx.is_authenticated());

        ctx.reload();
        assert!(ctx.is_authenticated());
    }

    #[test]
    fn test_partial_session_is_not_authenticated() {
        let jar = Arc::new(CookieJar::in_memory());
        jar.set(TOKEN_KEY, "abc", None).unwrap();
        let ctx = AuthContext::new(jar);
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn test_logout_clears_both_entries() {
        let jar = Arc::new(CookieJar::in_memory());
        persist_session(jar.as_ref(), &session()).unwrap();
        let ctx = AuthContext::new(jar.clone());
        assert!(ctx.is_authenticated());

        ctx.logout().unwrap();
        assert!(!ctx.is_authenticated());
        assert_eq!(jar.get(TOKEN_KEY), None);
        assert_eq!(jar.get(USER_ID_KEY), None);
    }

    #[test]
    fn test_google_client_id() {
        let ctx = AuthContext::new(Arc::new(CookieJar::in_memory()))
            .with_google_client_id(Some("client-123".to_string()));
        assert_eq!(ctx.google_client_id(), Some("client-123"));
    }
}
