//! Stack Auth REST client for credential sign-in.
//!
//! Implements [`AuthClient`] against the client-access endpoints:
//!
//! - `POST api/v1/auth/password/sign-in` with `{email, password}`
//! - `POST api/v1/auth/mfa/sign-in` with `{type: "totp", totp, code}`
//!
//! Known-error responses are mapped onto the rejections the controller
//! understands; everything else is returned as `Other`.

use crate::config::StackAuthConfig;
use crate::error::{StackAuthError, StackAuthResult};
use crate::known_error::{
    summarize_response_body, KnownError, EMAIL_PASSWORD_MISMATCH, INVALID_TOTP_CODE,
    KNOWN_ERROR_HEADER, MULTI_FACTOR_AUTHENTICATION_REQUIRED,
};
use async_trait::async_trait;
use credential_sign_in::{
    AuthClient, Credential, CredentialOutcome, CredentialRejection, SecondFactorOutcome,
    SecondFactorRejection, Session,
};
use serde::{Deserialize, Serialize};

const PASSWORD_SIGN_IN_PATH: &str = "api/v1/auth/password/sign-in";
const MFA_SIGN_IN_PATH: &str = "api/v1/auth/mfa/sign-in";

/// Stack Auth API client.
#[derive(Clone, Debug)]
pub struct StackAuthClient {
    http_client: reqwest::Client,
    config: StackAuthConfig,
}

#[derive(Serialize)]
struct PasswordSignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct MfaSignInRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    totp: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct SignInResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user_id: String,
}

impl From<SignInResponse> for Session {
    fn from(response: SignInResponse) -> Self {
        Session {
            user_id: response.user_id,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        }
    }
}

/// Result of a sign-in call that reached the server.
#[derive(Debug)]
enum Reply {
    Session(Session),
    Rejected(KnownError),
}

impl StackAuthClient {
    pub fn new(config: StackAuthConfig) -> StackAuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Create a client from `STACK_*` environment variables.
    pub fn from_env() -> StackAuthResult<Self> {
        Self::new(StackAuthConfig::from_env()?)
    }

    pub fn config(&self) -> &StackAuthConfig {
        &self.config
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> StackAuthResult<Reply> {
        let url = self.config.endpoint(path)?;

        let response = self
            .http_client
            .post(url)
            .header("x-stack-project-id", &self.config.project_id)
            .header(
                "x-stack-publishable-client-key",
                &self.config.publishable_client_key,
            )
            .header("x-stack-access-type", "client")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: SignInResponse = response.json().await?;
            return Ok(Reply::Session(body.into()));
        }

        let header_code = response
            .headers()
            .get(KNOWN_ERROR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        match KnownError::parse(status.as_u16(), header_code.as_deref(), &body) {
            Some(known) => {
                tracing::debug!(status = status.as_u16(), code = %known.code, "Stack Auth known error");
                Ok(Reply::Rejected(known))
            }
            None => {
                let body_summary = summarize_response_body(&body);
                tracing::error!(
                    status = status.as_u16(),
                    body_summary = %body_summary,
                    "Stack Auth API error"
                );
                Err(StackAuthError::Api {
                    status: status.as_u16(),
                    code: None,
                    message: format!("upstream error ({body_summary})"),
                })
            }
        }
    }
}

#[async_trait]
impl AuthClient for StackAuthClient {
    type Error = StackAuthError;

    async fn sign_in_with_credential(
        &self,
        credential: &Credential,
    ) -> CredentialOutcome<StackAuthError> {
        tracing::debug!(email = %credential.email, "Sending password sign-in request");

        let request = PasswordSignInRequest {
            email: &credential.email,
            password: &credential.password,
        };

        match self.post(PASSWORD_SIGN_IN_PATH, &request).await {
            Ok(Reply::Session(session)) => Ok(session),
            Ok(Reply::Rejected(known)) if known.is(EMAIL_PASSWORD_MISMATCH) => {
                Err(CredentialRejection::InvalidCredential {
                    message: known.message,
                })
            }
            Ok(Reply::Rejected(known)) if known.is(MULTI_FACTOR_AUTHENTICATION_REQUIRED) => {
                match known.attempt_code() {
                    Some(nonce) => Err(CredentialRejection::MultiFactorRequired {
                        nonce: nonce.to_string(),
                    }),
                    None => Err(CredentialRejection::Other(StackAuthError::InvalidResponse(
                        "Multi-factor authentication required but attempt code missing"
                            .to_string(),
                    ))),
                }
            }
            Ok(Reply::Rejected(known)) => Err(CredentialRejection::Other(known.into())),
            Err(err) => Err(CredentialRejection::Other(err)),
        }
    }

    async fn sign_in_with_second_factor(
        &self,
        nonce: &str,
        code: &str,
    ) -> SecondFactorOutcome<StackAuthError> {
        tracing::debug!("Sending TOTP sign-in request");

        let request = MfaSignInRequest {
            kind: "totp",
            totp: code,
            code: nonce,
        };

        match self.post(MFA_SIGN_IN_PATH, &request).await {
            Ok(Reply::Session(session)) => Ok(session),
            Ok(Reply::Rejected(known)) if known.is(INVALID_TOTP_CODE) => {
                Err(SecondFactorRejection::InvalidCode)
            }
            Ok(Reply::Rejected(known)) => Err(SecondFactorRejection::Other(known.into())),
            Err(err) => Err(SecondFactorRejection::Other(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = StackAuthConfig::new("http://localhost:8102", "proj", "pck").unwrap();
        let client = StackAuthClient::new(config).unwrap();
        assert_eq!(client.config().project_id, "proj");
    }

    #[test]
    fn test_mfa_request_serialization() {
        let request = MfaSignInRequest {
            kind: "totp",
            totp: "123456",
            code: "abc123",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "totp", "totp": "123456", "code": "abc123"})
        );
    }

    #[test]
    fn test_sign_in_response_without_refresh_token() {
        let response: SignInResponse =
            serde_json::from_str(r#"{"access_token":"a","user_id":"u"}"#).unwrap();
        let session = Session::from(response);
        assert_eq!(session.user_id, "u");
        assert!(session.refresh_token.is_none());
    }
}
