//! Local shape checks for the credential form.
//!
//! These run before anything is sent. A failure is shown on the offending
//! field and the attempt stays where it was.

use crate::attempt::{Field, FieldError};
use crate::client::Credential;
use crate::config::Messages;
use regex::Regex;
use std::sync::OnceLock;

/// Longest password the server accepts.
pub const MAX_PASSWORD_LENGTH: usize = 70;

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            // local@label.label...tld, no whitespace, no second '@'
            Regex::new(r"^[^\s@]+@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$")
                .ok()
        })
        .as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_some_and(|re| re.is_match(email))
}

/// Check a credential, returning the first failing field.
///
/// Order matches the form: email emptiness, email shape, password emptiness,
/// password length.
pub fn validate_credential(credential: &Credential, messages: &Messages) -> Result<(), FieldError> {
    let email = credential.email.trim();
    if email.is_empty() {
        return Err(FieldError::new(Field::Email, &messages.enter_email));
    }
    if !is_valid_email(email) {
        return Err(FieldError::new(Field::Email, &messages.invalid_email));
    }

    if credential.password.is_empty() {
        return Err(FieldError::new(Field::Password, &messages.enter_password));
    }
    if credential.password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(FieldError::new(Field::Password, &messages.password_too_long));
    }

    Ok(())
}
