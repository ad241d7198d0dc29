//! Configuration for the sign-in form.

use crate::error::{SignInError, SignInResult};
use crate::otp::OtpPolicy;
use serde::{Deserialize, Serialize};

/// Length of the authenticator code when nothing else is configured.
pub const DEFAULT_OTP_LENGTH: usize = 6;

/// Link target for the "Forgot password?" affordance.
pub const DEFAULT_FORGOT_PASSWORD_URL: &str = "/handler/forgot-password";

/// User-visible strings.
///
/// Translation lookup happens outside this crate; hosts replace these with
/// localized text before building the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub enter_email: String,
    pub invalid_email: String,
    pub enter_password: String,
    pub password_too_long: String,
    pub invalid_code: String,
    pub otp_prompt: String,
    pub forgot_password: String,
    pub sign_in: String,
    pub cancel: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            enter_email: "Please enter your email".into(),
            invalid_email: "Please enter a valid email".into(),
            enter_password: "Please enter your password".into(),
            password_too_long: "Password is too long".into(),
            invalid_code: "Invalid TOTP code".into(),
            otp_prompt: "Enter the TOTP code from your authenticator app".into(),
            forgot_password: "Forgot password?".into(),
            sign_in: "Sign In".into(),
            cancel: "Cancel".into(),
        }
    }
}

/// Sign-in form configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInConfig {
    /// Number of characters in a complete one-time code
    pub otp_length: usize,

    /// Where "Forgot password?" points
    pub forgot_password_url: String,

    pub messages: Messages,
}

impl Default for SignInConfig {
    fn default() -> Self {
        Self {
            otp_length: DEFAULT_OTP_LENGTH,
            forgot_password_url: DEFAULT_FORGOT_PASSWORD_URL.to_string(),
            messages: Messages::default(),
        }
    }
}

impl SignInConfig {
    /// Build a config from defaults overridden by environment variables.
    ///
    /// - `SIGN_IN_OTP_LENGTH`: positive integer
    /// - `SIGN_IN_FORGOT_PASSWORD_URL`: non-empty link target
    pub fn from_env() -> SignInResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("SIGN_IN_OTP_LENGTH") {
            let length: usize = raw.trim().parse().map_err(|_| {
                SignInError::Config(format!("SIGN_IN_OTP_LENGTH is not a number: {}", raw))
            })?;
            config = config.with_otp_length(length)?;
        }

        if let Ok(url) = std::env::var("SIGN_IN_FORGOT_PASSWORD_URL") {
            if !url.trim().is_empty() {
                config.forgot_password_url = url.trim().to_string();
            }
        }

        Ok(config)
    }

    /// Override the code length. Zero is rejected.
    pub fn with_otp_length(mut self, otp_length: usize) -> SignInResult<Self> {
        if otp_length == 0 {
            return Err(SignInError::Config(
                "OTP length must be at least 1".to_string(),
            ));
        }
        self.otp_length = otp_length;
        Ok(self)
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    pub fn otp_policy(&self) -> OtpPolicy {
        OtpPolicy::new(self.otp_length)
    }
}
