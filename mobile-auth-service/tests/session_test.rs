//! Integration tests for session issuance and refresh.

mod common;

use chrono::Utc;
use common::TestApp;
use mobile_auth_service::models::{CredentialDetail, RegistrationMethod, UserProfile};
use mobile_auth_service::services::{ServiceError, SessionClaims};

fn test_user() -> UserProfile {
    UserProfile::new(
        "user@example.com".to_string(),
        "user".to_string(),
        RegistrationMethod::Email,
    )
}

#[tokio::test]
async fn issue_signs_token_and_persists_registry_record() {
    let app = TestApp::spawn();
    let user = test_user();

    let session = app
        .state
        .sessions
        .issue(&user, Some("device-1".to_string()))
        .await
        .unwrap();

    assert_eq!(session.user_id, user.user_id);
    assert_eq!(session.email, "user@example.com");

    let remaining = session.expires_at - Utc::now().timestamp();
    assert!((29 * 86_400..=30 * 86_400).contains(&remaining));

    // The registry record is written already consumed.
    let records = app.store.credentials();
    assert_eq!(records.len(), 1);
    assert!(records[0].id.starts_with("sess_"));
    assert!(records[0].used);
    assert_eq!(records[0].user_id.as_deref(), Some(user.user_id.as_str()));
    match &records[0].detail {
        CredentialDetail::Session { artifact } => assert_eq!(*artifact, session.token),
        _ => panic!("expected session registry record"),
    }
}

#[tokio::test]
async fn refresh_is_a_no_op_outside_the_window() {
    let app = TestApp::spawn();
    let user = test_user();

    let session = app.state.sessions.issue(&user, None).await.unwrap();

    // A fresh 30-day session has far more than 7 days remaining.
    let refreshed = app.state.sessions.refresh(&session.token).await.unwrap();
    assert_eq!(refreshed.token, session.token);
    assert_eq!(refreshed.expires_at, session.expires_at);

    // No second registry record was written.
    assert_eq!(app.store.credentials().len(), 1);
}

#[tokio::test]
async fn refresh_reissues_inside_the_window() {
    let app = TestApp::spawn();

    // Hand-craft a session with 6 days remaining.
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: "user-1".to_string(),
        email: "user@example.com".to_string(),
        device_id: Some("device-1".to_string()),
        iat: now - 24 * 86_400,
        exp: now + 6 * 86_400,
    };
    let aging_token = app.tokens.sign_session(&claims).await.unwrap();

    let refreshed = app.state.sessions.refresh(&aging_token).await.unwrap();

    assert_ne!(refreshed.token, aging_token);
    assert_eq!(refreshed.user_id, "user-1");
    assert_eq!(refreshed.email, "user@example.com");

    let remaining = refreshed.expires_at - Utc::now().timestamp();
    assert!((29 * 86_400..=30 * 86_400).contains(&remaining));

    // Subject and device carry over into the new artifact.
    let decoded = app.tokens.verify_session(&refreshed.token).await.unwrap();
    assert_eq!(decoded.sub, "user-1");
    assert_eq!(decoded.device_id.as_deref(), Some("device-1"));

    // Re-issue persists a fresh registry record.
    assert_eq!(app.store.credentials().len(), 1);
}

#[tokio::test]
async fn refresh_rejects_expired_session() {
    let app = TestApp::spawn();

    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: "user-1".to_string(),
        email: "user@example.com".to_string(),
        device_id: None,
        iat: now - 31 * 86_400,
        exp: now - 86_400,
    };
    let expired_token = app.tokens.sign_session(&claims).await.unwrap();

    let err = app.state.sessions.refresh(&expired_token).await.unwrap_err();
    assert!(matches!(err, ServiceError::SessionInvalid));
}

#[tokio::test]
async fn refresh_rejects_garbage_token() {
    let app = TestApp::spawn();
    let err = app.state.sessions.refresh("not.a.jwt").await.unwrap_err();
    assert!(matches!(err, ServiceError::SessionInvalid));
}
