//! Stack Auth known-error responses.
//!
//! Failed requests carry a JSON body `{code, error, details}` and the code in
//! the `x-stack-known-error` header. Only a handful of codes mean something to
//! the sign-in flow; the rest become [`StackAuthError::Api`].

use crate::error::StackAuthError;
use serde::Deserialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const KNOWN_ERROR_HEADER: &str = "x-stack-known-error";

pub const EMAIL_PASSWORD_MISMATCH: &str = "EMAIL_PASSWORD_MISMATCH";
pub const MULTI_FACTOR_AUTHENTICATION_REQUIRED: &str = "MULTI_FACTOR_AUTHENTICATION_REQUIRED";
pub const INVALID_TOTP_CODE: &str = "INVALID_TOTP_CODE";

#[derive(Debug, Default, Deserialize)]
struct KnownErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// A decoded known-error response.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownError {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl KnownError {
    /// Decode an error response. Returns `None` when neither the header nor
    /// the body names a code.
    pub fn parse(status: u16, header_code: Option<&str>, body: &str) -> Option<Self> {
        let parsed: KnownErrorBody = serde_json::from_str(body).unwrap_or_default();
        let code = header_code
            .map(str::to_string)
            .or(parsed.code)
            .filter(|code| !code.is_empty())?;

        Some(Self {
            status,
            message: parsed.error.unwrap_or_else(|| code.clone()),
            code,
            details: parsed.details,
        })
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// `details.attempt_code` of a second-factor challenge.
    pub fn attempt_code(&self) -> Option<&str> {
        self.details
            .as_ref()?
            .get("attempt_code")?
            .as_str()
            .filter(|code| !code.is_empty())
    }
}

impl From<KnownError> for StackAuthError {
    fn from(err: KnownError) -> Self {
        StackAuthError::Api {
            status: err.status,
            code: Some(err.code),
            message: err.message,
        }
    }
}

/// Length and digest of a response body, for logs that must not echo it.
pub(crate) fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}
