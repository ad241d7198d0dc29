//! The mutable record behind one sign-in attempt.
//!
//! Only the controller mutates a [`SignInAttempt`]. It owns the FSM, the
//! second-factor nonce, the code buffer and the single displayed error, and
//! keeps them consistent: the nonce exists exactly while the phase is one of
//! the second-factor phases.

use crate::error::{SignInError, SignInResult};
use crate::sign_in_fsm::{Phase, SignInMachine, SignInMachineInput};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Form field an error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Password,
    Otp,
}

/// The error currently shown under a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub struct SignInAttempt {
    id: Uuid,
    machine: SignInMachine,
    nonce: Option<String>,
    otp_buffer: String,
    field_error: Option<FieldError>,
    /// Bumped on every request start and every cancel; responses carrying an
    /// older value are stale.
    generation: u64,
}

impl SignInAttempt {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            machine: SignInMachine::new(),
            nonce: None,
            otp_buffer: String::new(),
            field_error: None,
            generation: 0,
        }
    }

    /// Identifier used to correlate log lines of one attempt.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        Phase::from(self.machine.state())
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn otp_buffer(&self) -> &str {
        &self.otp_buffer
    }

    pub fn field_error(&self) -> Option<&FieldError> {
        self.field_error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Transition the FSM, logging when the phase actually changes.
    pub(crate) fn transition(&mut self, input: &SignInMachineInput) -> SignInResult<Phase> {
        let old_phase = self.phase();

        self.machine.consume(input).map_err(|_| {
            SignInError::InvalidStateTransition(format!(
                "Cannot apply {:?} in phase {}",
                input, old_phase
            ))
        })?;

        let new_phase = self.phase();
        if old_phase != new_phase {
            debug!(
                attempt_id = %self.id,
                old_phase = %old_phase,
                new_phase = %new_phase,
                "Sign-in phase transition"
            );
        }

        Ok(new_phase)
    }

    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub(crate) fn set_field_error(&mut self, error: FieldError) {
        self.field_error = Some(error);
    }

    pub(crate) fn clear_field_error(&mut self) {
        self.field_error = None;
    }

    pub(crate) fn set_otp_buffer(&mut self, buffer: String) {
        self.otp_buffer = buffer;
    }

    pub(crate) fn clear_otp_buffer(&mut self) {
        self.otp_buffer.clear();
    }

    /// Start a second-factor episode with a freshly issued nonce.
    pub(crate) fn begin_second_factor(&mut self, nonce: String) {
        debug_assert!(self.nonce.is_none(), "nonce from a previous episode");
        self.nonce = Some(nonce);
        self.otp_buffer.clear();
    }

    /// End the second-factor episode; the nonce is never handed out again.
    pub(crate) fn end_second_factor(&mut self) {
        self.nonce = None;
        self.otp_buffer.clear();
    }
}

impl Default for SignInAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SignInAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInAttempt")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .field("has_nonce", &self.nonce.is_some())
            .field("otp_filled", &self.otp_buffer.chars().count())
            .field("field_error", &self.field_error)
            .field("generation", &self.generation)
            .finish()
    }
}
