//! Sign-in attempt state machine using rust-fsm.
//!
//! One attempt moves from credential entry through an optional second-factor
//! challenge to a signed-in session. The table below is the only place that
//! decides which transitions are legal; guards (field validation, OTP length,
//! in-flight checks) live in the controller and are evaluated before an input
//! is consumed.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐ CredentialRejected / CredentialFailed
//! │      Idle       │ ◄────────────────────────────────────┐
//! └────────┬────────┘                                      │
//!          │ CredentialSubmitted                           │
//!          ▼                                               │
//! ┌──────────────────────┐                                 │
//! │ SubmittingCredential │ ────────────────────────────────┘
//! └──────┬─────────┬─────┘
//!        │         │ SecondFactorRequired
//!        │         ▼
//!        │  ┌──────────────────────┐  CodeEntered (self)
//!        │  │ AwaitingSecondFactor │ ◄──────────┐
//!        │  └──────┬───────────────┘            │ CodeRejected / CodeFailed
//!        │         │ CodeCompleted              │
//!        │         ▼                            │
//!        │  ┌────────────────────────┐          │
//!        │  │ SubmittingSecondFactor │ ─────────┘
//!        │  └──────┬─────────────────┘
//!        │         │ CodeAccepted           (Cancelled from either
//!        ▼         ▼                         second-factor state → Idle)
//! ┌─────────────────┐
//! │    Succeeded    │ (terminal)
//! └─────────────────┘
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub sign_in_machine(Idle)

    Idle => {
        CredentialSubmitted => SubmittingCredential
    },
    SubmittingCredential => {
        CredentialAccepted => Succeeded,
        // Server rejected the email/password pair
        CredentialRejected => Idle,
        // Correct password, server wants a one-time code before issuing a session
        SecondFactorRequired => AwaitingSecondFactor,
        CredentialFailed => Idle
    },
    AwaitingSecondFactor => {
        // Partial or empty buffer, nothing sent
        CodeEntered => AwaitingSecondFactor,
        CodeCompleted => SubmittingSecondFactor,
        Cancelled => Idle
    },
    SubmittingSecondFactor => {
        CodeAccepted => Succeeded,
        CodeRejected => AwaitingSecondFactor,
        CodeFailed => AwaitingSecondFactor,
        // The in-flight verification becomes stale
        Cancelled => Idle
    }
}

pub use sign_in_machine::Input as SignInMachineInput;
pub use sign_in_machine::State as SignInMachineState;
pub use sign_in_machine::StateMachine as SignInMachine;

/// Phase of a sign-in attempt as seen by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Credential form is shown and accepts input.
    Idle,
    /// Email/password request is in flight.
    SubmittingCredential,
    /// Waiting for the user to type the one-time code.
    AwaitingSecondFactor,
    /// One-time code verification is in flight.
    SubmittingSecondFactor,
    /// A session was issued and handed off.
    Succeeded,
}

impl Phase {
    /// Returns true while a request is outstanding.
    pub fn is_submitting(&self) -> bool {
        matches!(
            self,
            Phase::SubmittingCredential | Phase::SubmittingSecondFactor
        )
    }

    /// Returns true while the second-factor challenge is shown.
    pub fn is_second_factor(&self) -> bool {
        matches!(
            self,
            Phase::AwaitingSecondFactor | Phase::SubmittingSecondFactor
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Succeeded)
    }
}

impl From<&SignInMachineState> for Phase {
    fn from(state: &SignInMachineState) -> Self {
        match state {
            SignInMachineState::Idle => Phase::Idle,
            SignInMachineState::SubmittingCredential => Phase::SubmittingCredential,
            SignInMachineState::AwaitingSecondFactor => Phase::AwaitingSecondFactor,
            SignInMachineState::SubmittingSecondFactor => Phase::SubmittingSecondFactor,
            SignInMachineState::Succeeded => Phase::Succeeded,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::SubmittingCredential => "submitting_credential",
            Phase::AwaitingSecondFactor => "awaiting_second_factor",
            Phase::SubmittingSecondFactor => "submitting_second_factor",
            Phase::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in_second_factor() -> SignInMachine {
        let mut machine = SignInMachine::new();
        machine
            .consume(&SignInMachineInput::CredentialSubmitted)
            .unwrap();
        machine
            .consume(&SignInMachineInput::SecondFactorRequired)
            .unwrap();
        machine
    }

    #[test]
    fn test_initial_state_is_idle() {
        let machine = SignInMachine::new();
        assert_eq!(*machine.state(), SignInMachineState::Idle);
    }

    #[test]
    fn test_password_only_flow() {
        let mut machine = SignInMachine::new();

        machine
            .consume(&SignInMachineInput::CredentialSubmitted)
            .unwrap();
        assert_eq!(*machine.state(), SignInMachineState::SubmittingCredential);

        machine
            .consume(&SignInMachineInput::CredentialAccepted)
            .unwrap();
        assert_eq!(*machine.state(), SignInMachineState::Succeeded);
    }

    #[test]
    fn test_rejected_credential_returns_to_idle() {
        let mut machine = SignInMachine::new();
        machine
            .consume(&SignInMachineInput::CredentialSubmitted)
            .unwrap();

        machine
            .consume(&SignInMachineInput::CredentialRejected)
            .unwrap();
        assert_eq!(*machine.state(), SignInMachineState::Idle);
    }

    #[test]
    fn test_second_factor_flow() {
        let mut machine = machine_in_second_factor();
        assert_eq!(*machine.state(), SignInMachineState::AwaitingSecondFactor);

        // Partial entry stays put
        machine.consume(&SignInMachineInput::CodeEntered).unwrap();
        assert_eq!(*machine.state(), SignInMachineState::AwaitingSecondFactor);

        machine.consume(&SignInMachineInput::CodeCompleted).unwrap();
        assert_eq!(*machine.state(), SignInMachineState::SubmittingSecondFactor);

        machine.consume(&SignInMachineInput::CodeRejected).unwrap();
        assert_eq!(*machine.state(), SignInMachineState::AwaitingSecondFactor);

        machine.consume(&SignInMachineInput::CodeCompleted).unwrap();
        machine.consume(&SignInMachineInput::CodeAccepted).unwrap();
        assert_eq!(*machine.state(), SignInMachineState::Succeeded);
    }

    #[test]
    fn test_cancel_from_both_second_factor_states() {
        let mut machine = machine_in_second_factor();
        machine.consume(&SignInMachineInput::Cancelled).unwrap();
        assert_eq!(*machine.state(), SignInMachineState::Idle);

        let mut machine = machine_in_second_factor();
        machine.consume(&SignInMachineInput::CodeCompleted).unwrap();
        machine.consume(&SignInMachineInput::Cancelled).unwrap();
        assert_eq!(*machine.state(), SignInMachineState::Idle);
    }

    #[test]
    fn test_cannot_submit_code_while_idle() {
        let mut machine = SignInMachine::new();

        assert!(machine
            .consume(&SignInMachineInput::CodeCompleted)
            .is_err());
        assert!(machine.consume(&SignInMachineInput::Cancelled).is_err());
        assert_eq!(*machine.state(), SignInMachineState::Idle);
    }

    #[test]
    fn test_cannot_resubmit_while_submitting() {
        let mut machine = SignInMachine::new();
        machine
            .consume(&SignInMachineInput::CredentialSubmitted)
            .unwrap();

        assert!(machine
            .consume(&SignInMachineInput::CredentialSubmitted)
            .is_err());

        let mut machine = machine_in_second_factor();
        machine.consume(&SignInMachineInput::CodeCompleted).unwrap();
        assert!(machine
            .consume(&SignInMachineInput::CodeCompleted)
            .is_err());
    }

    #[test]
    fn test_succeeded_is_terminal() {
        let mut machine = SignInMachine::new();
        machine
            .consume(&SignInMachineInput::CredentialSubmitted)
            .unwrap();
        machine
            .consume(&SignInMachineInput::CredentialAccepted)
            .unwrap();

        assert!(machine
            .consume(&SignInMachineInput::CredentialSubmitted)
            .is_err());
        assert!(machine.consume(&SignInMachineInput::Cancelled).is_err());
    }

    #[test]
    fn test_phase_conversion() {
        assert_eq!(Phase::from(&SignInMachineState::Idle), Phase::Idle);
        assert_eq!(
            Phase::from(&SignInMachineState::SubmittingCredential),
            Phase::SubmittingCredential
        );
        assert_eq!(
            Phase::from(&SignInMachineState::AwaitingSecondFactor),
            Phase::AwaitingSecondFactor
        );
        assert_eq!(
            Phase::from(&SignInMachineState::SubmittingSecondFactor),
            Phase::SubmittingSecondFactor
        );
        assert_eq!(
            Phase::from(&SignInMachineState::Succeeded),
            Phase::Succeeded
        );
    }

    #[test]
    fn test_phase_predicates() {
        assert!(!Phase::Idle.is_submitting());
        assert!(Phase::SubmittingCredential.is_submitting());
        assert!(Phase::SubmittingSecondFactor.is_submitting());
        assert!(Phase::AwaitingSecondFactor.is_second_factor());
        assert!(Phase::SubmittingSecondFactor.is_second_factor());
        assert!(!Phase::SubmittingCredential.is_second_factor());
        assert!(Phase::Succeeded.is_terminal());
        assert!(!Phase::Idle.is_terminal());
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        let json = serde_json::to_string(&Phase::AwaitingSecondFactor).unwrap();
        assert_eq!(json, "\"awaiting_second_factor\"");
        assert_eq!(Phase::SubmittingCredential.to_string(), "submitting_credential");
    }
}
