//! API client for the Novel Hub authentication endpoint.
//!
//! This module provides the `ApiClient` struct used by the login flow to
//! exchange credentials for a session token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::auth::{AuthError, Authenticator};
use crate::models::{Credentials, LoginResponse};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path of the login route, relative to the configured API base URL
const LOGIN_PATH: &str = "/auth/login";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the Novel Hub server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against `base_url` (the `VITE_API_URL` value)
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn login_url(&self) -> String {
        format!("{}{}", self.base_url, LOGIN_PATH)
    }

    /// Send the credentials to `POST {API_URL}/auth/login`
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let url = self.login_url();
        debug!(%url, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %ApiError::truncate_body(&body), "Login request rejected");
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl Authenticator for ApiClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        self.login(credentials).await.map_err(|e| {
            warn!(error = %e, "Authentication request failed");
            AuthError::RequestFailed(e.user_message())
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
