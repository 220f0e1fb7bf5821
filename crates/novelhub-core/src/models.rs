//! Wire and domain types shared by the login flow and the API client.
//!
//! With the `ts` feature enabled these types also derive TypeScript
//! bindings so the web front end can consume the same shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Email/password pair collected by a login form.
///
/// Only lives for the duration of one submission and is never persisted.
#[derive(Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of a successful `POST /auth/login`.
///
/// Both fields are optional on the wire; `Session::from_response` refuses
/// to build a session unless both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

/// Body of a rejected auth request: `{ "msg": "..." }`. Servers may omit `msg`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ErrorResponse {
    #[serde(default)]
    pub msg: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("reader@example.com", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("reader@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_serialize_shape() {
        let creds = Credentials::new("reader@example.com", "pw");
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json, serde_json::json!({"email": "reader@example.com", "password": "pw"}));
    }

    #[test]
    fn test_login_response_parses_camel_case() {
        let parsed: LoginResponse = serde_json::from_str(r#"{"token":"abc","userId":"1"}"#).unwrap();
        assert_eq!(parsed.token.as_deref(), Some("abc"));
        assert_eq!(parsed.user_id.as_deref(), Some("1"));

        let partial: LoginResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert!(partial.user_id.is_none());
    }

    #[test]
    fn test_error_response_msg_is_optional() {
        let parsed: ErrorResponse = serde_json::from_str(r#"{"msg":"Invalid credentials"}"#).unwrap();
        assert_eq!(parsed.msg.as_deref(), Some("Invalid credentials"));

        let empty: ErrorResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.msg.is_none());
    }
}
