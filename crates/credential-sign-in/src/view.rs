//! Render snapshot of an attempt.

use crate::attempt::{Field, FieldError};
use crate::sign_in_fsm::Phase;
use serde::{Deserialize, Serialize};

/// Everything the rendering layer needs to draw the form.
///
/// Deliberately excludes the nonce and the typed code digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInView {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_error: Option<FieldError>,
    pub otp_length: usize,
    /// Number of code slots currently filled
    pub otp_filled: usize,
    /// Credential request in flight (submit button spinner)
    pub loading: bool,
    pub otp_input_disabled: bool,
    pub forgot_password_url: String,
}

impl SignInView {
    /// Message to show under `field`, if the current error belongs to it.
    pub fn error_for(&self, field: Field) -> Option<&str> {
        self.field_error
            .as_ref()
            .filter(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    /// The second-factor challenge replaces the credential form.
    pub fn shows_second_factor(&self) -> bool {
        self.phase.is_second_factor()
    }
}
