use thiserror::Error;

/// Message shown when an email address fails local validation.
pub const INVALID_EMAIL_MESSAGE: &str = "Invalid email format...";

/// Errors a login form can show. Every variant is recoverable: the form
/// stays editable and the user may submit again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Local validation failed; no request was sent.
    #[error("{}", INVALID_EMAIL_MESSAGE)]
    InvalidFormat,

    /// The server rejected the credentials or could not be reached.
    /// Holds the message to display.
    #[error("{0}")]
    RequestFailed(String),

    /// A submission is already pending.
    #[error("A login request is already in progress")]
    SubmitInProgress,

    /// Authentication succeeded but the session could not be stored.
    #[error("Failed to save session: {0}")]
    Storage(String),
}
