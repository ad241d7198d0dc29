//! Sign-in error types.
//!
//! Only failures the controller cannot recover from locally end up here.
//! Expected rejections (wrong password, wrong code, second factor required)
//! are state transitions, not errors.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which request of the attempt produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInStep {
    Credential,
    SecondFactor,
}

impl fmt::Display for SignInStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignInStep::Credential => f.write_str("credential"),
            SignInStep::SecondFactor => f.write_str("second-factor"),
        }
    }
}

/// Sign-in error type.
#[derive(Error, Debug)]
pub enum SignInError {
    /// The auth client failed in a way the form has no recovery for
    #[error("Unexpected {step} sign-in failure: {source}")]
    Unexpected {
        step: SignInStep,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Second factor requested without an attempt code to continue with
    #[error("Second factor required but the server sent no attempt code")]
    MissingNonce,

    /// Invalid state transition in the sign-in FSM
    #[error("Invalid sign-in state transition: {0}")]
    InvalidStateTransition(String),

    /// The event driver is no longer running
    #[error("Sign-in driver has stopped")]
    DriverStopped,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SignInError {
    pub(crate) fn unexpected<E>(step: SignInStep, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SignInError::Unexpected {
            step,
            source: Box::new(source),
        }
    }

    /// Step that failed, if the error came from a request.
    pub fn step(&self) -> Option<SignInStep> {
        match self {
            SignInError::Unexpected { step, .. } => Some(*step),
            SignInError::MissingNonce => Some(SignInStep::Credential),
            _ => None,
        }
    }
}

/// Result type alias using SignInError.
pub type SignInResult<T> = Result<T, SignInError>;
