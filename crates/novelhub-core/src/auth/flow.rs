//! The login form's submit path: validate, authenticate, persist, reload,
//! navigate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::{Credentials, LoginResponse};

use super::context::AuthContext;
use super::session::{persist_session, Persistence, Session};
use super::validation::validate_email;
use super::AuthError;

/// Route shown after a successful login
pub const LANDING_ROUTE: &str = "/home";

/// Exchanges credentials for a token. `ApiClient` is the real implementation.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError>;
}

/// Moves the front end to another route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Holds the submit flag for the duration of one submission.
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitGuard(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct LoginFlow<A> {
    authenticator: A,
    context: Arc<AuthContext>,
    navigator: Arc<dyn Navigator>,
    submitting: AtomicBool,
    error: Mutex<Option<String>>,
}

impl<A: Authenticator> LoginFlow<A> {
    pub fn new(authenticator: A, context: Arc<AuthContext>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            authenticator,
            context,
            navigator,
            submitting: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &Arc<AuthContext> {
        &self.context
    }

    /// True while a submission is pending (the submit control is disabled)
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Message from the last failed submission, cleared on the next one
    pub fn error(&self) -> Option<String> {
        self.error.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn set_error(&self, message: Option<String>) {
        *self.error.lock().unwrap_or_else(|p| p.into_inner()) = message;
    }

    /// Submit the login form.
    ///
    /// At most one submission runs at a time; a second call while one is
    /// pending returns `SubmitInProgress` without touching the network.
    /// Failures are never retried.
    pub async fn submit_credentials(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<Session, AuthError> {
        let _guard = SubmitGuard::acquire(&self.submitting).ok_or(AuthError::SubmitInProgress)?;
        self.set_error(None);

        let result = self.submit(email, password, remember_me).await;
        if let Err(ref e) = result {
            self.set_error(Some(e.to_string()));
        }
        result
    }

    async fn submit(&self, email: &str, password: &str, remember_me: bool) -> Result<Session, AuthError> {
        if let Err(e) = validate_email(email) {
            warn!("Rejected login with malformed email");
            return Err(e);
        }

        let credentials = Credentials::new(email, password);
        let response = self.authenticator.authenticate(&credentials).await?;

        let session = Session::from_response(response, Persistence::from_remember_me(remember_me))
            .inspect_err(|_| warn!("Login response missing token or userId"))?;

        persist_session(self.context.store(), &session).map_err(|e| {
            warn!(error = %e, "Failed to save session");
            AuthError::Storage(e.to_string())
        })?;

        self.context.reload();
        self.navigator.navigate(LANDING_ROUTE);

        info!(user_id = %session.user_id, persistence = ?session.persistence, "Login successful");
        Ok(session)
    }
}

// ============================================================================
// Tests
// ============================================================================
