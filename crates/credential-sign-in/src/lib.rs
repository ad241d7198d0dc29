//! Credential sign-in with an inline second-factor challenge.
//!
//! This crate provides:
//! - An explicit FSM for one sign-in attempt (password, optional TOTP step)
//! - A controller that applies user events and auth client responses to it
//! - Local credential shape validation and the one-time code entry policy
//! - A single-task event driver that discards responses for superseded requests
//!
//! Network access is behind the [`AuthClient`] trait.

mod attempt;
mod client;
mod config;
mod controller;
mod driver;
mod error;
mod otp;
mod sign_in_fsm;
mod validation;
mod view;

#[cfg(test)]
mod tests;

pub use attempt::{Field, FieldError, SignInAttempt};
pub use client::{
    AuthClient, Credential, CredentialOutcome, CredentialRejection, SecondFactorOutcome,
    SecondFactorRejection, Session,
};
pub use config::{Messages, SignInConfig, DEFAULT_FORGOT_PASSWORD_URL, DEFAULT_OTP_LENGTH};
pub use controller::{
    CredentialRequest, CredentialResponse, RequestTicket, SecondFactorRequest,
    SecondFactorResponse, SignInController,
};
pub use driver::{
    channel, channel_with_capacity, SignInDriver, SignInEvent, SignInHandle,
    DEFAULT_EVENT_CAPACITY,
};
pub use error::{SignInError, SignInResult, SignInStep};
pub use otp::{OtpEntry, OtpPolicy};
pub use sign_in_fsm::sign_in_machine;
pub use sign_in_fsm::{Phase, SignInMachine, SignInMachineInput, SignInMachineState};
pub use validation::{is_valid_email, validate_credential, MAX_PASSWORD_LENGTH};
pub use view::SignInView;
