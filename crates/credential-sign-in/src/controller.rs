//! Sign-in controller.
//!
//! Drives one [`SignInAttempt`] through the FSM in response to user events
//! and auth client responses. Every request goes through a begin/resolve pair:
//!
//! - `begin_*` checks the guards, clears the displayed error, moves the FSM
//!   into a submitting phase and returns a request carrying a
//!   [`RequestTicket`].
//! - `resolve_*` matches the response's ticket against the attempt. A response
//!   for a superseded request (cancelled, or overtaken by a newer one) is
//!   discarded without touching the attempt.
//!
//! The async methods ([`SignInController::submit_credential`] and friends)
//! chain the two around a call to the [`AuthClient`] for hosts that do not
//! need to interleave other events while a request is outstanding. The event
//! driver uses the split API directly.

use crate::attempt::{Field, FieldError, SignInAttempt};
use crate::client::{
    AuthClient, Credential, CredentialOutcome, CredentialRejection, SecondFactorOutcome,
    SecondFactorRejection, Session,
};
use crate::config::{Messages, SignInConfig};
use crate::error::{SignInError, SignInResult, SignInStep};
use crate::otp::{OtpEntry, OtpPolicy};
use crate::sign_in_fsm::{Phase, SignInMachineInput};
use crate::validation::validate_credential;
use crate::view::SignInView;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Identifies the request a response belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    nonce: Option<String>,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTicket")
            .field("generation", &self.generation)
            .field("has_nonce", &self.nonce.is_some())
            .finish()
    }
}

/// An email/password verification the controller wants sent.
#[derive(Debug)]
pub struct CredentialRequest {
    ticket: RequestTicket,
    credential: Credential,
}

impl CredentialRequest {
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn ticket(&self) -> &RequestTicket {
        &self.ticket
    }

    /// Pair an outcome obtained elsewhere with this request.
    pub fn respond<E>(self, outcome: CredentialOutcome<E>) -> CredentialResponse<E> {
        CredentialResponse {
            ticket: self.ticket,
            outcome,
        }
    }

    pub async fn send<C>(self, client: &C) -> CredentialResponse<C::Error>
    where
        C: AuthClient + ?Sized,
    {
        let outcome = client.sign_in_with_credential(&self.credential).await;
        self.respond(outcome)
    }
}

#[derive(Debug)]
pub struct CredentialResponse<E> {
    pub ticket: RequestTicket,
    pub outcome: CredentialOutcome<E>,
}

/// A one-time code verification the controller wants sent.
pub struct SecondFactorRequest {
    ticket: RequestTicket,
    nonce: String,
    code: String,
}

impl SecondFactorRequest {
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn ticket(&self) -> &RequestTicket {
        &self.ticket
    }

    pub fn respond<E>(self, outcome: SecondFactorOutcome<E>) -> SecondFactorResponse<E> {
        SecondFactorResponse {
            ticket: self.ticket,
            outcome,
        }
    }

    pub async fn send<C>(self, client: &C) -> SecondFactorResponse<C::Error>
    where
        C: AuthClient + ?Sized,
    {
        let outcome = client
            .sign_in_with_second_factor(&self.nonce, &self.code)
            .await;
        self.respond(outcome)
    }
}

impl fmt::Debug for SecondFactorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondFactorRequest")
            .field("ticket", &self.ticket)
            .field("code_len", &self.code.len())
            .finish()
    }
}

#[derive(Debug)]
pub struct SecondFactorResponse<E> {
    pub ticket: RequestTicket,
    pub outcome: SecondFactorOutcome<E>,
}

/// Owns the sign-in attempt and applies every transition to it.
pub struct SignInController<C: AuthClient> {
    client: Arc<C>,
    config: SignInConfig,
    policy: OtpPolicy,
    attempt: SignInAttempt,
}

impl<C: AuthClient> SignInController<C> {
    /// Create a controller with a fresh attempt.
    pub fn new(client: C, config: SignInConfig) -> Self {
        Self::with_shared_client(Arc::new(client), config)
    }

    pub fn with_shared_client(client: Arc<C>, config: SignInConfig) -> Self {
        let policy = config.otp_policy();
        Self {
            client,
            config,
            policy,
            attempt: SignInAttempt::new(),
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn attempt(&self) -> &SignInAttempt {
        &self.attempt
    }

    pub fn phase(&self) -> Phase {
        self.attempt.phase()
    }

    pub fn field_error(&self) -> Option<&FieldError> {
        self.attempt.field_error()
    }

    pub fn nonce(&self) -> Option<&str> {
        self.attempt.nonce()
    }

    pub fn otp_buffer(&self) -> &str {
        self.attempt.otp_buffer()
    }

    /// Credential request in flight.
    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::SubmittingCredential
    }

    /// Code verification in flight; the code input ignores changes.
    pub fn otp_input_disabled(&self) -> bool {
        self.phase() == Phase::SubmittingSecondFactor
    }

    pub fn forgot_password_url(&self) -> &str {
        &self.config.forgot_password_url
    }

    pub fn messages(&self) -> &Messages {
        &self.config.messages
    }

    pub fn config(&self) -> &SignInConfig {
        &self.config
    }

    pub fn view(&self) -> SignInView {
        SignInView {
            phase: self.phase(),
            field_error: self.attempt.field_error().cloned(),
            otp_length: self.policy.length(),
            otp_filled: self.attempt.otp_buffer().chars().count(),
            loading: self.is_loading(),
            otp_input_disabled: self.otp_input_disabled(),
            forgot_password_url: self.config.forgot_password_url.clone(),
        }
    }

    /// Submit the credential form and wait for the server's answer.
    ///
    /// Returns the session when sign-in completes without a second factor.
    /// Wrong credentials and second-factor challenges are reflected in the
    /// attempt, not returned as errors.
    pub async fn submit_credential(
        &mut self,
        email: &str,
        password: &str,
    ) -> SignInResult<Option<Session>> {
        let Some(request) = self.begin_credential(email, password)? else {
            return Ok(None);
        };
        let client = Arc::clone(&self.client);
        let response = request.send(client.as_ref()).await;
        self.resolve_credential(response)
    }

    /// Handle a change of the code input, verifying once it is complete.
    pub async fn otp_digits_changed(&mut self, buffer: &str) -> SignInResult<Option<Session>> {
        let Some(request) = self.enter_otp(buffer)? else {
            return Ok(None);
        };
        let client = Arc::clone(&self.client);
        let response = request.send(client.as_ref()).await;
        self.resolve_second_factor(response)
    }

    /// Submit a whole code at once. No-op outside `AwaitingSecondFactor`.
    pub async fn submit_second_factor(&mut self, code: &str) -> SignInResult<Option<Session>> {
        let Some(request) = self.begin_second_factor(code)? else {
            return Ok(None);
        };
        let client = Arc::clone(&self.client);
        let response = request.send(client.as_ref()).await;
        self.resolve_second_factor(response)
    }

    /// Leave the second-factor challenge and return to the credential form.
    ///
    /// Safe while a verification is in flight: its response will be stale.
    /// Returns false when there was no challenge to leave.
    pub fn cancel_second_factor(&mut self) -> SignInResult<bool> {
        if !self.phase().is_second_factor() {
            debug!(
                attempt_id = %self.attempt.id(),
                phase = %self.phase(),
                "Ignoring cancel outside second factor"
            );
            return Ok(false);
        }

        self.attempt.transition(&SignInMachineInput::Cancelled)?;
        self.attempt.end_second_factor();
        self.attempt.clear_field_error();
        self.attempt.next_generation();

        info!(attempt_id = %self.attempt.id(), "Second factor cancelled");
        Ok(true)
    }

    /// Validate the form and, if it passes, start a credential request.
    ///
    /// Returns `None` when the submission is dropped (not idle) or fails
    /// local validation; in the latter case the field error is set.
    pub fn begin_credential(
        &mut self,
        email: &str,
        password: &str,
    ) -> SignInResult<Option<CredentialRequest>> {
        if self.phase() != Phase::Idle {
            debug!(
                attempt_id = %self.attempt.id(),
                phase = %self.phase(),
                "Dropping credential submission"
            );
            return Ok(None);
        }

        self.attempt.clear_field_error();

        let credential = Credential::new(email.trim(), password);
        if let Err(field_error) = validate_credential(&credential, &self.config.messages) {
            debug!(
                attempt_id = %self.attempt.id(),
                field = ?field_error.field,
                "Credential failed local validation"
            );
            self.attempt.set_field_error(field_error);
            return Ok(None);
        }

        self.attempt
            .transition(&SignInMachineInput::CredentialSubmitted)?;
        let generation = self.attempt.next_generation();

        debug!(
            attempt_id = %self.attempt.id(),
            email = %credential.email,
            generation,
            "Submitting credential"
        );

        Ok(Some(CredentialRequest {
            ticket: RequestTicket {
                generation,
                nonce: None,
            },
            credential,
        }))
    }

    /// Apply the server's answer to a credential request.
    pub fn resolve_credential(
        &mut self,
        response: CredentialResponse<C::Error>,
    ) -> SignInResult<Option<Session>> {
        if !self.is_current(&response.ticket, Phase::SubmittingCredential) {
            warn!(
                attempt_id = %self.attempt.id(),
                generation = response.ticket.generation,
                phase = %self.phase(),
                "Discarding stale credential response"
            );
            return Ok(None);
        }

        match response.outcome {
            Ok(session) => {
                self.attempt
                    .transition(&SignInMachineInput::CredentialAccepted)?;
                info!(
                    attempt_id = %self.attempt.id(),
                    user_id = %session.user_id,
                    "Sign-in successful"
                );
                Ok(Some(session))
            }
            Err(CredentialRejection::InvalidCredential { message }) => {
                self.attempt
                    .transition(&SignInMachineInput::CredentialRejected)?;
                self.attempt
                    .set_field_error(FieldError::new(Field::Email, message));
                Ok(None)
            }
            Err(CredentialRejection::MultiFactorRequired { nonce }) => {
                if nonce.trim().is_empty() {
                    self.attempt
                        .transition(&SignInMachineInput::CredentialFailed)?;
                    error!(
                        attempt_id = %self.attempt.id(),
                        "Second factor required without attempt code"
                    );
                    return Err(SignInError::MissingNonce);
                }

                self.attempt
                    .transition(&SignInMachineInput::SecondFactorRequired)?;
                self.attempt.begin_second_factor(nonce);
                info!(attempt_id = %self.attempt.id(), "Second factor required");
                Ok(None)
            }
            Err(CredentialRejection::Other(source)) => {
                self.attempt
                    .transition(&SignInMachineInput::CredentialFailed)?;
                error!(
                    attempt_id = %self.attempt.id(),
                    error = %source,
                    "Credential sign-in failed unexpectedly"
                );
                Err(SignInError::unexpected(SignInStep::Credential, source))
            }
        }
    }

    /// Handle a change of the code input.
    ///
    /// - outside `AwaitingSecondFactor` the change is dropped
    /// - a buffer the input would refuse leaves the attempt unchanged
    /// - empty: nothing else happens, any error stays visible
    /// - partial or overflowing: the error is cleared
    /// - complete: a verification request is started
    pub fn enter_otp(&mut self, buffer: &str) -> SignInResult<Option<SecondFactorRequest>> {
        if self.phase() != Phase::AwaitingSecondFactor {
            debug!(
                attempt_id = %self.attempt.id(),
                phase = %self.phase(),
                "Dropping code input change"
            );
            return Ok(None);
        }

        let Some(buffer) = self.policy.normalize(buffer) else {
            debug!(attempt_id = %self.attempt.id(), "Refusing non-digit code input");
            return Ok(None);
        };

        let entry = self.policy.classify(&buffer);
        self.attempt.set_otp_buffer(buffer);

        if entry != OtpEntry::Complete {
            if entry.clears_error() {
                self.attempt.clear_field_error();
            }
            self.attempt.transition(&SignInMachineInput::CodeEntered)?;
            return Ok(None);
        }

        self.start_second_factor_request()
    }

    /// Start verifying `code` as if it had been typed in one go.
    pub fn begin_second_factor(
        &mut self,
        code: &str,
    ) -> SignInResult<Option<SecondFactorRequest>> {
        if self.phase() != Phase::AwaitingSecondFactor || self.attempt.nonce().is_none() {
            debug!(
                attempt_id = %self.attempt.id(),
                phase = %self.phase(),
                "Ignoring second-factor submission"
            );
            return Ok(None);
        }

        self.enter_otp(code)
    }

    /// Apply the server's answer to a code verification.
    ///
    /// The code buffer is emptied on every outcome, so after a wrong code the
    /// user re-enters all digits.
    pub fn resolve_second_factor(
        &mut self,
        response: SecondFactorResponse<C::Error>,
    ) -> SignInResult<Option<Session>> {
        if !self.is_current(&response.ticket, Phase::SubmittingSecondFactor) {
            warn!(
                attempt_id = %self.attempt.id(),
                generation = response.ticket.generation,
                phase = %self.phase(),
                "Discarding stale second-factor response"
            );
            return Ok(None);
        }

        self.attempt.clear_otp_buffer();

        match response.outcome {
            Ok(session) => {
                self.attempt.transition(&SignInMachineInput::CodeAccepted)?;
                self.attempt.end_second_factor();
                info!(
                    attempt_id = %self.attempt.id(),
                    user_id = %session.user_id,
                    "Sign-in successful after second factor"
                );
                Ok(Some(session))
            }
            Err(SecondFactorRejection::InvalidCode) => {
                self.attempt.transition(&SignInMachineInput::CodeRejected)?;
                self.attempt.set_field_error(FieldError::new(
                    Field::Otp,
                    &self.config.messages.invalid_code,
                ));
                Ok(None)
            }
            Err(SecondFactorRejection::Other(source)) => {
                self.attempt.transition(&SignInMachineInput::CodeFailed)?;
                error!(
                    attempt_id = %self.attempt.id(),
                    error = %source,
                    "Second-factor sign-in failed unexpectedly"
                );
                Err(SignInError::unexpected(SignInStep::SecondFactor, source))
            }
        }
    }

    fn start_second_factor_request(&mut self) -> SignInResult<Option<SecondFactorRequest>> {
        let Some(nonce) = self.attempt.nonce().map(str::to_string) else {
            warn!(
                attempt_id = %self.attempt.id(),
                "Complete code without an active nonce"
            );
            return Ok(None);
        };

        self.attempt.clear_field_error();
        self.attempt.transition(&SignInMachineInput::CodeCompleted)?;
        let generation = self.attempt.next_generation();
        let code = self.attempt.otp_buffer().to_string();

        debug!(
            attempt_id = %self.attempt.id(),
            generation,
            "Submitting second factor"
        );

        Ok(Some(SecondFactorRequest {
            ticket: RequestTicket {
                generation,
                nonce: Some(nonce.clone()),
            },
            nonce,
            code,
        }))
    }

    fn is_current(&self, ticket: &RequestTicket, expected: Phase) -> bool {
        self.phase() == expected
            && ticket.generation == self.attempt.generation()
            && ticket.nonce.as_deref() == self.attempt.nonce()
    }
}

impl<C: AuthClient> fmt::Debug for SignInController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInController")
            .field("attempt", &self.attempt)
            .field("otp_length", &self.policy.length())
            .finish()
    }
}
