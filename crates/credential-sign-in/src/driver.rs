//! Event loop for a sign-in form.
//!
//! A [`SignInDriver`] owns the controller and runs on a single task. User
//! events arrive on an mpsc channel; requests started by those events are
//! polled in the same task, so every event and every response is applied to
//! the attempt one at a time, run to completion. Completed responses are
//! applied before new events when both are ready.
//!
//! The rendering layer holds a [`SignInHandle`]: it sends events and watches
//! [`SignInView`] snapshots published after each step.

use crate::client::{AuthClient, Session};
use crate::controller::{
    CredentialRequest, CredentialResponse, SecondFactorRequest, SecondFactorResponse,
    SignInController,
};
use crate::error::{SignInError, SignInResult};
use crate::view::SignInView;
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 16;

/// Input from the rendering layer.
#[derive(Clone, PartialEq, Eq)]
pub enum SignInEvent {
    SubmitCredential { email: String, password: String },
    /// The code input now holds this buffer.
    OtpChanged(String),
    SubmitSecondFactor(String),
    CancelSecondFactor,
}

impl fmt::Debug for SignInEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignInEvent::SubmitCredential { email, .. } => f
                .debug_struct("SubmitCredential")
                .field("email", email)
                .field("password", &"[redacted]")
                .finish(),
            SignInEvent::OtpChanged(buffer) => f
                .debug_tuple("OtpChanged")
                .field(&buffer.chars().count())
                .finish(),
            SignInEvent::SubmitSecondFactor(_) => f.write_str("SubmitSecondFactor"),
            SignInEvent::CancelSecondFactor => f.write_str("CancelSecondFactor"),
        }
    }
}

enum Response<E> {
    Credential(CredentialResponse<E>),
    SecondFactor(SecondFactorResponse<E>),
}

type InFlight<E> = FuturesUnordered<BoxFuture<'static, Response<E>>>;

/// Rendering-side end of a driver.
#[derive(Clone)]
pub struct SignInHandle {
    events: mpsc::Sender<SignInEvent>,
    views: watch::Receiver<SignInView>,
}

impl SignInHandle {
    pub async fn send(&self, event: SignInEvent) -> SignInResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| SignInError::DriverStopped)
    }

    pub async fn submit_credential(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> SignInResult<()> {
        self.send(SignInEvent::SubmitCredential {
            email: email.into(),
            password: password.into(),
        })
        .await
    }

    pub async fn otp_changed(&self, buffer: impl Into<String>) -> SignInResult<()> {
        self.send(SignInEvent::OtpChanged(buffer.into())).await
    }

    pub async fn cancel_second_factor(&self) -> SignInResult<()> {
        self.send(SignInEvent::CancelSecondFactor).await
    }

    /// Latest published snapshot.
    pub fn view(&self) -> SignInView {
        self.views.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SignInView> {
        self.views.clone()
    }
}

/// Task-side end: owns the controller and processes events.
pub struct SignInDriver<C: AuthClient + 'static> {
    controller: SignInController<C>,
    events: mpsc::Receiver<SignInEvent>,
    views: watch::Sender<SignInView>,
}

/// Create a driver around `controller` and the handle that feeds it.
pub fn channel<C>(controller: SignInController<C>) -> (SignInDriver<C>, SignInHandle)
where
    C: AuthClient + 'static,
{
    channel_with_capacity(controller, DEFAULT_EVENT_CAPACITY)
}

pub fn channel_with_capacity<C>(
    controller: SignInController<C>,
    capacity: usize,
) -> (SignInDriver<C>, SignInHandle)
where
    C: AuthClient + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(capacity);
    let (view_tx, view_rx) = watch::channel(controller.view());

    (
        SignInDriver {
            controller,
            events: event_rx,
            views: view_tx,
        },
        SignInHandle {
            events: event_tx,
            views: view_rx,
        },
    )
}

impl<C: AuthClient + 'static> SignInDriver<C> {
    /// Process events until the attempt ends.
    ///
    /// Returns the session on success, `None` once every handle is dropped
    /// (the form went away), or the first unexpected failure. Requests still
    /// in flight when the loop ends are dropped.
    pub async fn run(mut self) -> SignInResult<Option<Session>> {
        let mut in_flight: InFlight<C::Error> = FuturesUnordered::new();

        loop {
            tokio::select! {
                biased;

                Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                    let applied = self.apply(response);
                    self.publish();
                    if let Some(session) = applied? {
                        return Ok(Some(session));
                    }
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        debug!(
                            attempt_id = %self.controller.attempt().id(),
                            pending = in_flight.len(),
                            "Sign-in form closed"
                        );
                        return Ok(None);
                    };
                    let handled = self.handle_event(event, &mut in_flight);
                    self.publish();
                    handled?;
                }
            }
        }
    }

    fn handle_event(
        &mut self,
        event: SignInEvent,
        in_flight: &mut InFlight<C::Error>,
    ) -> SignInResult<()> {
        debug!(
            attempt_id = %self.controller.attempt().id(),
            event = ?event,
            "Sign-in event"
        );

        match event {
            SignInEvent::SubmitCredential { email, password } => {
                if let Some(request) = self.controller.begin_credential(&email, &password)? {
                    in_flight.push(self.dispatch_credential(request));
                }
            }
            SignInEvent::OtpChanged(buffer) => {
                if let Some(request) = self.controller.enter_otp(&buffer)? {
                    in_flight.push(self.dispatch_second_factor(request));
                }
            }
            SignInEvent::SubmitSecondFactor(code) => {
                if let Some(request) = self.controller.begin_second_factor(&code)? {
                    in_flight.push(self.dispatch_second_factor(request));
                }
            }
            SignInEvent::CancelSecondFactor => {
                self.controller.cancel_second_factor()?;
            }
        }

        Ok(())
    }

    fn apply(&mut self, response: Response<C::Error>) -> SignInResult<Option<Session>> {
        let result = match response {
            Response::Credential(response) => self.controller.resolve_credential(response),
            Response::SecondFactor(response) => self.controller.resolve_second_factor(response),
        };

        if let Err(err) = &result {
            error!(
                attempt_id = %self.controller.attempt().id(),
                error = %err,
                "Sign-in driver stopping on unexpected failure"
            );
        }

        result
    }

    fn dispatch_credential(&self, request: CredentialRequest) -> BoxFuture<'static, Response<C::Error>> {
        let client = Arc::clone(self.controller.client());
        Box::pin(async move { Response::Credential(request.send(client.as_ref()).await) })
    }

    fn dispatch_second_factor(
        &self,
        request: SecondFactorRequest,
    ) -> BoxFuture<'static, Response<C::Error>> {
        let client = Arc::clone(self.controller.client());
        Box::pin(async move { Response::SecondFactor(request.send(client.as_ref()).await) })
    }

    fn publish(&self) {
        let view = self.controller.view();
        self.views.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}
