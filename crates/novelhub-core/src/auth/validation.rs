//! Local email checks run before any credentials leave the client.

use std::sync::LazyLock;

use regex::Regex;

use super::AuthError;

/// `local@domain.tld` with no whitespace and exactly one `@`.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Validate an email address the way the login form does.
///
/// Rejects addresses that do not look like `local@domain.tld`, addresses
/// whose local part is purely numeric, and domains containing digits.
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if !EMAIL_PATTERN.is_match(email) || is_all_digits(email) {
        return Err(AuthError::InvalidFormat);
    }

    // The pattern guarantees exactly one '@'
    let (local, domain) = email.split_once('@').ok_or(AuthError::InvalidFormat)?;

    if is_all_digits(local) || domain.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::InvalidFormat);
    }

    Ok(())
}
