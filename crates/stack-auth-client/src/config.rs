//! Configuration for the Stack Auth client.

use crate::error::{StackAuthError, StackAuthResult};
use std::time::Duration;
use url::Url;

/// Hosted Stack Auth API.
pub const DEFAULT_API_URL: &str = "https://api.stack-auth.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Stack Auth client configuration.
#[derive(Debug, Clone)]
pub struct StackAuthConfig {
    /// Base URL of the API; always ends with `/`
    pub api_url: Url,

    /// Project the users belong to
    pub project_id: String,

    /// Publishable client key of the project
    pub publishable_client_key: String,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl StackAuthConfig {
    pub fn new(
        api_url: &str,
        project_id: impl Into<String>,
        publishable_client_key: impl Into<String>,
    ) -> StackAuthResult<Self> {
        let mut api_url = Url::parse(api_url)?;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        Ok(Self {
            api_url,
            project_id: project_id.into(),
            publishable_client_key: publishable_client_key.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Load the configuration from the environment.
    ///
    /// `STACK_PROJECT_ID` and `STACK_PUBLISHABLE_CLIENT_KEY` are required;
    /// `STACK_API_URL` and `STACK_REQUEST_TIMEOUT_SECS` have defaults.
    pub fn from_env() -> StackAuthResult<Self> {
        let api_url =
            std::env::var("STACK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let project_id = std::env::var("STACK_PROJECT_ID")
            .map_err(|_| StackAuthError::MissingConfig("STACK_PROJECT_ID"))?;
        let publishable_client_key = std::env::var("STACK_PUBLISHABLE_CLIENT_KEY")
            .map_err(|_| StackAuthError::MissingConfig("STACK_PUBLISHABLE_CLIENT_KEY"))?;

        let timeout_secs: u64 = std::env::var("STACK_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self::new(&api_url, project_id, publishable_client_key)?
            .with_request_timeout(Duration::from_secs(timeout_secs)))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Resolve an API path such as `api/v1/auth/password/sign-in`.
    pub fn endpoint(&self, path: &str) -> StackAuthResult<Url> {
        Ok(self.api_url.join(path.trim_start_matches('/'))?)
    }
}
