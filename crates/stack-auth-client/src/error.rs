//! Error types for the Stack Auth client.

use thiserror::Error;

/// Errors that can occur while talking to the Stack Auth API.
#[derive(Error, Debug)]
pub enum StackAuthError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API base URL could not be parsed or joined
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// API returned an error response the sign-in flow has no handling for
    #[error("Stack Auth API error: {status} - {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Invalid response from API (missing expected fields)
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Required configuration value is not set
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
}

/// Result type alias using StackAuthError.
pub type StackAuthResult<T> = Result<T, StackAuthError>;
