//! End-to-end sign-in scenarios against the scripted client.

use super::harness::{controller, controller_awaiting_code, Call, ScriptedClient};
use crate::{Field, Phase};

#[tokio::test]
async fn password_only_sign_in_succeeds() {
    let client = ScriptedClient::new();
    client.accept_credential("user-1");
    let (mut controller, client) = controller(client);

    let session = controller
        .submit_credential("a@b.com", "correct")
        .await
        .unwrap()
        .expect("session handed off");

    assert_eq!(session.user_id, "user-1");
    assert_eq!(controller.phase(), Phase::Succeeded);
    assert!(controller.field_error().is_none());
    assert!(controller.nonce().is_none());
    assert_eq!(
        client.calls(),
        vec![Call::Credential {
            email: "a@b.com".to_string(),
            password: "correct".to_string(),
        }]
    );
}

#[tokio::test]
async fn wrong_password_returns_to_idle_with_email_error() {
    let client = ScriptedClient::new();
    client.reject_credential("Invalid email or password");
    let (mut controller, _client) = controller(client);

    let session = controller
        .submit_credential("a@b.com", "wrong")
        .await
        .unwrap();

    assert!(session.is_none());
    assert_eq!(controller.phase(), Phase::Idle);
    let error = controller.field_error().unwrap();
    assert_eq!(error.field, Field::Email);
    assert_eq!(error.message, "Invalid email or password");
}

#[tokio::test]
async fn second_factor_required_stores_nonce() {
    let (controller, client) = controller_awaiting_code("abc123").await;

    assert_eq!(controller.phase(), Phase::AwaitingSecondFactor);
    assert_eq!(controller.nonce(), Some("abc123"));
    assert_eq!(controller.otp_buffer(), "");
    assert!(controller.field_error().is_none());
    assert!(client.second_factor_calls().is_empty());
}

#[tokio::test]
async fn wrong_code_then_right_code() {
    let (mut controller, client) = controller_awaiting_code("abc123").await;
    client.reject_code().accept_code("user-1");

    let session = controller.otp_digits_changed("000000").await.unwrap();
    assert!(session.is_none());
    assert_eq!(controller.phase(), Phase::AwaitingSecondFactor);
    assert_eq!(controller.otp_buffer(), "");
    let error = controller.field_error().unwrap();
    assert_eq!(error.field, Field::Otp);
    assert_eq!(error.message, "Invalid TOTP code");

    let session = controller
        .otp_digits_changed("123456")
        .await
        .unwrap()
        .expect("session handed off");
    assert_eq!(session.user_id, "user-1");
    assert_eq!(controller.phase(), Phase::Succeeded);
    assert!(controller.field_error().is_none());
    assert!(controller.nonce().is_none());
    assert_eq!(controller.otp_buffer(), "");

    assert_eq!(
        client.second_factor_calls(),
        vec![
            Call::SecondFactor {
                nonce: "abc123".to_string(),
                code: "000000".to_string(),
            },
            Call::SecondFactor {
                nonce: "abc123".to_string(),
                code: "123456".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn cancel_returns_to_credential_form() {
    let (mut controller, client) = controller_awaiting_code("abc123").await;
    client.reject_code();
    controller.otp_digits_changed("000000").await.unwrap();
    controller.otp_digits_changed("12").await.unwrap();
    assert!(controller.field_error().is_none());
    controller.otp_digits_changed("").await.unwrap();

    assert!(controller.cancel_second_factor().unwrap());

    assert_eq!(controller.phase(), Phase::Idle);
    assert!(controller.nonce().is_none());
    assert_eq!(controller.otp_buffer(), "");
    assert!(controller.field_error().is_none());
}

#[tokio::test]
async fn cancel_clears_displayed_code_error() {
    let (mut controller, client) = controller_awaiting_code("abc123").await;
    client.reject_code();
    controller.otp_digits_changed("000000").await.unwrap();
    assert!(controller.field_error().is_some());

    assert!(controller.cancel_second_factor().unwrap());

    assert_eq!(controller.phase(), Phase::Idle);
    assert!(controller.nonce().is_none());
    assert!(controller.field_error().is_none());
}

#[tokio::test]
async fn new_episode_after_cancel_uses_new_nonce() {
    let (mut controller, client) = controller_awaiting_code("abc123").await;
    controller.cancel_second_factor().unwrap();

    client.require_second_factor("def456").accept_code("user-1");
    controller
        .submit_credential("a@b.com", "correct")
        .await
        .unwrap();
    assert_eq!(controller.nonce(), Some("def456"));

    controller
        .otp_digits_changed("654321")
        .await
        .unwrap()
        .expect("session handed off");

    assert_eq!(
        client.second_factor_calls(),
        vec![Call::SecondFactor {
            nonce: "def456".to_string(),
            code: "654321".to_string(),
        }]
    );
}

#[tokio::test]
async fn succeeded_attempt_ignores_further_input() {
    let client = ScriptedClient::new();
    client.accept_credential("user-1");
    let (mut controller, client) = controller(client);
    controller
        .submit_credential("a@b.com", "correct")
        .await
        .unwrap();

    assert!(controller
        .submit_credential("a@b.com", "correct")
        .await
        .unwrap()
        .is_none());
    assert!(controller.otp_digits_changed("123456").await.unwrap().is_none());
    assert!(!controller.cancel_second_factor().unwrap());

    assert_eq!(controller.phase(), Phase::Succeeded);
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test]
async fn email_is_trimmed_before_sending() {
    let client = ScriptedClient::new();
    client.accept_credential("user-1");
    let (mut controller, client) = controller(client);

    controller
        .submit_credential("  a@b.com ", "correct")
        .await
        .unwrap();

    assert_eq!(
        client.credential_calls(),
        vec![Call::Credential {
            email: "a@b.com".to_string(),
            password: "correct".to_string(),
        }]
    );
}

#[tokio::test]
async fn view_tracks_the_attempt() {
    let (mut controller, _client) = controller_awaiting_code("abc123").await;
    controller.otp_digits_changed("123").await.unwrap();

    let view = controller.view();
    assert_eq!(view.phase, Phase::AwaitingSecondFactor);
    assert!(view.shows_second_factor());
    assert_eq!(view.otp_length, 6);
    assert_eq!(view.otp_filled, 3);
    assert!(!view.loading);
    assert!(!view.otp_input_disabled);
    assert_eq!(view.forgot_password_url, "/handler/forgot-password");

    let json = serde_json::to_string(&view).unwrap();
    assert!(!json.contains("abc123"));
}
