//! REST API client module for the Novel Hub server.
//!
//! This module provides the `ApiClient` for exchanging credentials with
//! the `/auth/login` endpoint. The server answers with a bearer token and
//! the user's id, or with a `{ msg }` body explaining the rejection.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, GENERIC_FAILURE_MESSAGE};
