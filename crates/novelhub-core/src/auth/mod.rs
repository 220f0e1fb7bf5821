//! Authentication module for the login flow and session state.
//!
//! This module provides:
//! - `LoginFlow`: validate → authenticate → persist → reload → navigate
//! - `Session`: the token/user pair issued by the server
//! - `SessionStore` / `CookieJar`: cookie-style persisted key/value entries
//! - `AuthContext`: explicit shared view of the current session
//!
//! "Remember me" sessions are kept for one day; others only for the
//! current browsing context.

pub mod context;
pub mod error;
pub mod flow;
pub mod session;
pub mod storage;
pub mod validation;

pub use context::{AuthContext, SessionSnapshot};
pub use error::{AuthError, INVALID_EMAIL_MESSAGE};
pub use flow::{Authenticator, LoginFlow, Navigator, LANDING_ROUTE};
pub use session::{clear_session, persist_session, Persistence, Session, TOKEN_KEY, USER_ID_KEY};
pub use storage::{CookieJar, SessionStore, StoredEntry};
pub use validation::validate_email;
