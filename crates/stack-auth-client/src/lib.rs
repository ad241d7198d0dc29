//! Stack Auth implementation of the credential sign-in [`AuthClient`].
//!
//! [`AuthClient`]: credential_sign_in::AuthClient

mod client;
mod config;
mod error;
mod known_error;

pub use client::StackAuthClient;
pub use config::{StackAuthConfig, DEFAULT_API_URL};
pub use error::{StackAuthError, StackAuthResult};
pub use known_error::{
    KnownError, EMAIL_PASSWORD_MISMATCH, INVALID_TOTP_CODE, KNOWN_ERROR_HEADER,
    MULTI_FACTOR_AUTHENTICATION_REQUIRED,
};
