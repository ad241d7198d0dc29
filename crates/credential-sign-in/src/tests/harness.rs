//! Test harness for sign-in controller and driver tests.
//!
//! Provides:
//! - ScriptedClient: an AuthClient that replays queued outcomes and records calls
//! - MockTransportError: the "anything else" failure the client can return
//! - helpers to build sessions and controllers

use crate::{
    AuthClient, Credential, CredentialOutcome, CredentialRejection, SecondFactorOutcome,
    SecondFactorRejection, Session, SignInConfig, SignInController,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Error)]
#[error("mock transport failure: {0}")]
pub struct MockTransportError(pub String);

/// A request received by the scripted client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Credential { email: String, password: String },
    SecondFactor { nonce: String, code: String },
}

/// Auth client that answers from queues filled by the test.
///
/// An empty queue answers with `Other(MockTransportError)`.
#[derive(Default)]
pub struct ScriptedClient {
    credential_outcomes: Mutex<VecDeque<CredentialOutcome<MockTransportError>>>,
    second_factor_outcomes: Mutex<VecDeque<SecondFactorOutcome<MockTransportError>>>,
    calls: Mutex<Vec<Call>>,
    /// When set, each second-factor call waits for a permit before answering.
    second_factor_gate: Option<Arc<Semaphore>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_second_factor_gate(gate: Arc<Semaphore>) -> Self {
        Self {
            second_factor_gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_credential(&self, outcome: CredentialOutcome<MockTransportError>) -> &Self {
        self.credential_outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn push_second_factor(&self, outcome: SecondFactorOutcome<MockTransportError>) -> &Self {
        self.second_factor_outcomes
            .lock()
            .unwrap()
            .push_back(outcome);
        self
    }

    pub fn accept_credential(&self, user_id: &str) -> &Self {
        self.push_credential(Ok(session(user_id)))
    }

    pub fn reject_credential(&self, message: &str) -> &Self {
        self.push_credential(Err(CredentialRejection::InvalidCredential {
            message: message.to_string(),
        }))
    }

    pub fn require_second_factor(&self, nonce: &str) -> &Self {
        self.push_credential(Err(CredentialRejection::MultiFactorRequired {
            nonce: nonce.to_string(),
        }))
    }

    pub fn accept_code(&self, user_id: &str) -> &Self {
        self.push_second_factor(Ok(session(user_id)))
    }

    pub fn reject_code(&self) -> &Self {
        self.push_second_factor(Err(SecondFactorRejection::InvalidCode))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn credential_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Credential { .. }))
            .collect()
    }

    pub fn second_factor_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::SecondFactor { .. }))
            .collect()
    }
}

#[async_trait]
impl AuthClient for ScriptedClient {
    type Error = MockTransportError;

    async fn sign_in_with_credential(
        &self,
        credential: &Credential,
    ) -> CredentialOutcome<MockTransportError> {
        self.calls.lock().unwrap().push(Call::Credential {
            email: credential.email.clone(),
            password: credential.password.clone(),
        });

        self.credential_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(CredentialRejection::Other(MockTransportError(
                    "no scripted credential outcome".to_string(),
                )))
            })
    }

    async fn sign_in_with_second_factor(
        &self,
        nonce: &str,
        code: &str,
    ) -> SecondFactorOutcome<MockTransportError> {
        self.calls.lock().unwrap().push(Call::SecondFactor {
            nonce: nonce.to_string(),
            code: code.to_string(),
        });

        if let Some(gate) = &self.second_factor_gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.second_factor_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(SecondFactorRejection::Other(MockTransportError(
                    "no scripted second-factor outcome".to_string(),
                )))
            })
    }
}

pub fn session(user_id: &str) -> Session {
    Session {
        user_id: user_id.to_string(),
        access_token: format!("access-{}", user_id),
        refresh_token: Some(format!("refresh-{}", user_id)),
    }
}

/// Controller over a shared client so the test can inspect recorded calls.
pub fn controller(client: ScriptedClient) -> (SignInController<ScriptedClient>, Arc<ScriptedClient>) {
    let client = Arc::new(client);
    let controller =
        SignInController::with_shared_client(Arc::clone(&client), SignInConfig::default());
    (controller, client)
}

/// Controller already sitting in `AwaitingSecondFactor` with `nonce`.
///
/// The caller scripts only the second-factor outcomes.
pub async fn controller_awaiting_code(
    nonce: &str,
) -> (SignInController<ScriptedClient>, Arc<ScriptedClient>) {
    let client = ScriptedClient::new();
    client.require_second_factor(nonce);
    let (mut controller, client) = controller(client);

    let session = controller
        .submit_credential("a@b.com", "correct")
        .await
        .unwrap();
    assert!(session.is_none());

    (controller, client)
}
