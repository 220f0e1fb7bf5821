use thiserror::Error;

use crate::models::ErrorResponse;

/// Message shown when the server gives no usable explanation.
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred. Please try again.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request rejected ({status}): {}", .msg.as_deref().unwrap_or("no message"))]
    Rejected {
        status: reqwest::StatusCode,
        msg: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build an error from a non-2xx response, keeping the server's `msg`
    /// field when the body carries one.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let msg = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|b| b.msg)
            .filter(|m| !m.is_empty());
        ApiError::Rejected { status, msg }
    }

    /// The text a login form should display for this error.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { msg: Some(msg), .. } => msg.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
