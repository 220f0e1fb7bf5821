//! Novel Hub core library.
//!
//! Login flow and session storage for the web client, plus the lifecycle
//! manager for the server's MongoDB connection.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod store;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthContext, AuthError, CookieJar, LoginFlow, Navigator, Session, SessionStore};
pub use config::{Config, Settings};
pub use models::{Credentials, LoginResponse};
pub use store::{ConnectionManager, ExitStatus, MongoDriver, StoreError};
