//! Auth client boundary.
//!
//! The controller never talks to the network itself. It hands credentials and
//! one-time codes to an [`AuthClient`] and matches on the tagged result; how
//! the client reaches the server, retries or stores tokens is its own concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Email/password pair for a single submission.
///
/// Created on submit and dropped once the request resolves.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Session issued by the server on successful sign-in.
///
/// Ownership passes to the caller; the attempt keeps no copy.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"[redacted]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Non-success answers to a credential submission.
#[derive(Debug)]
pub enum CredentialRejection<E> {
    /// Email/password pair was rejected; `message` is shown on the email field.
    InvalidCredential { message: String },
    /// Password accepted, but a second factor is needed. `nonce` binds the
    /// follow-up code submission to this attempt.
    MultiFactorRequired { nonce: String },
    /// Anything else.
    Other(E),
}

/// Non-success answers to a second-factor submission.
#[derive(Debug)]
pub enum SecondFactorRejection<E> {
    InvalidCode,
    Other(E),
}

pub type CredentialOutcome<E> = Result<Session, CredentialRejection<E>>;
pub type SecondFactorOutcome<E> = Result<Session, SecondFactorRejection<E>>;

/// Server-side sign-in operations consumed by the controller.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Transport or protocol failure that is not one of the known rejections.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Verify an email/password pair.
    async fn sign_in_with_credential(
        &self,
        credential: &Credential,
    ) -> CredentialOutcome<Self::Error>;

    /// Verify a one-time code against the attempt identified by `nonce`.
    async fn sign_in_with_second_factor(
        &self,
        nonce: &str,
        code: &str,
    ) -> SecondFactorOutcome<Self::Error>;
}
