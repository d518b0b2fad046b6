//! HTTP-level tests: routing, status codes, and wire shapes.

mod common;

use common::{get, post_json, TestApp};
use serde_json::json;
use service_core::axum::http::StatusCode;

// ============================================================================
// Health and routing
// ============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn();
    let (status, body) = get(app.router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "mobile-auth-service");
}

#[tokio::test]
async fn routes_answer_under_the_version_prefix_too() {
    let app = TestApp::spawn();

    let (status, _) = get(app.router(), "/v1/health").await;
    assert_eq!(status, StatusCode::OK);

    app.approve("user@example.com");
    let (status, body) = post_json(
        app.router(),
        "/v1/auth/request-magic-link",
        &[],
        json!({"email": "user@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

// ============================================================================
// Magic-link endpoints
// ============================================================================

#[tokio::test]
async fn request_magic_link_speaks_camel_case() {
    let app = TestApp::spawn();
    app.approve("user@example.com");

    let (status, body) = post_json(
        app.router(),
        "/auth/request-magic-link",
        &[],
        json!({"email": "user@example.com"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["expiresIn"], 900);
}

#[tokio::test]
async fn request_magic_link_maps_errors_to_status_codes() {
    let app = TestApp::spawn();

    let (status, body) = post_json(
        app.router(),
        "/auth/request-magic-link",
        &[],
        json!({"email": "not-an-email"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = post_json(
        app.router(),
        "/auth/request-magic-link",
        &[],
        json!({"email": "stranger@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn verify_magic_link_returns_session_payload() {
    let app = TestApp::spawn();
    app.approve("user@example.com");
    app.state
        .magic_links
        .request_link("user@example.com")
        .await
        .unwrap();
    let token = app.last_magic_link_token();

    let (status, body) = post_json(
        app.router(),
        "/auth/verify-magic-link",
        &[],
        json!({"token": token, "deviceId": "device-1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["token"].is_string());
    assert!(body["expiresAt"].is_i64());
    assert_eq!(body["user"]["email"], "user@example.com");
    assert!(body["user"]["userId"].is_string());

    // Reuse maps to 400.
    let (status, body) = post_json(
        app.router(),
        "/auth/verify-magic-link",
        &[],
        json!({"token": app.last_magic_link_token(), "deviceId": "device-1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn verify_magic_link_unknown_token_is_404() {
    let app = TestApp::spawn();
    let (status, body) = post_json(
        app.router(),
        "/auth/verify-magic-link",
        &[],
        json!({"token": "ml_missing", "deviceId": "device-1"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn refresh_token_round_trips() {
    let app = TestApp::spawn();
    app.approve("user@example.com");
    app.state
        .magic_links
        .request_link("user@example.com")
        .await
        .unwrap();
    let verified = app
        .state
        .magic_links
        .verify(&app.last_magic_link_token(), "device-1")
        .await
        .unwrap();

    let (status, body) = post_json(
        app.router(),
        "/auth/refresh-token",
        &[],
        json!({"token": verified.session.token}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], verified.session.token);

    let (status, _) = post_json(
        app.router(),
        "/auth/refresh-token",
        &[],
        json!({"token": "garbage"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn send_to_mobile_rejects_bad_api_key_with_401() {
    let app = TestApp::spawn();
    app.approve("user@example.com");

    let (status, _) = post_json(
        app.router(),
        "/auth/send-to-mobile",
        &[],
        json!({
            "email": "user@example.com",
            "phoneNumber": "+14155551234",
            "apiKey": "wrong"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Phone endpoints
// ============================================================================

#[tokio::test]
async fn phone_validate_requires_api_key_header() {
    let app = TestApp::spawn();
    let proof = app.email_proof("b@x.com");

    let (status, _) = post_json(
        app.router(),
        "/phone/validate",
        &[],
        json!({
            "phoneNumber": "+14155551234",
            "email": "b@x.com",
            "emailhash": proof
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn phone_flow_over_http() {
    let app = TestApp::spawn();
    app.approve("b@x.com");
    let proof = app.email_proof("b@x.com");

    let (status, body) = post_json(
        app.router(),
        "/phone/validate",
        &[("x-api-key", common::TEST_API_KEY)],
        json!({
            "phoneNumber": "+14155551234",
            "email": "b@x.com",
            "emailhash": proof
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let code = app.last_sms_code();
    let (status, body) = post_json(
        app.router(),
        "/phone/verify",
        &[("x-api-key", common::TEST_API_KEY)],
        json!({
            "phoneNumber": "+14155551234",
            "email": "b@x.com",
            "emailhash": proof,
            "verificationCode": code
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn phone_verify_wrong_code_is_404() {
    let app = TestApp::spawn();
    app.approve("b@x.com");
    let proof = app.email_proof("b@x.com");

    app.state.otp.issue("+14155551234", "b@x.com").await.unwrap();
    let code = app.last_sms_code();
    let wrong = if code == "10000" { "10001" } else { "10000" };

    let (status, body) = post_json(
        app.router(),
        "/phone/verify",
        &[("x-api-key", common::TEST_API_KEY)],
        json!({
            "phoneNumber": "+14155551234",
            "email": "b@x.com",
            "emailhash": proof,
            "verificationCode": wrong
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Verification code not found or expired");
}

// ============================================================================
// Embed endpoint
// ============================================================================

#[tokio::test]
async fn generate_embed_url_speaks_snake_case() {
    let app = TestApp::spawn();
    app.approve("user@example.com");
    app.state
        .magic_links
        .request_link("user@example.com")
        .await
        .unwrap();
    let verified = app
        .state
        .magic_links
        .verify(&app.last_magic_link_token(), "device-1")
        .await
        .unwrap();

    let bearer = format!("Bearer {}", verified.session.token);
    let (status, body) = post_json(
        app.router(),
        "/generate-embed-url",
        &[("authorization", bearer.as_str())],
        json!({
            "workbook_id": "wb-1",
            "merchant_id": "merch-9"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["url"].as_str().unwrap().contains("/workbook/wb-1?"));
    assert!(body["jwt"].is_string());
    assert!(body["expires_at"].is_i64());
}

#[tokio::test]
async fn generate_embed_url_without_bearer_is_401() {
    let app = TestApp::spawn();
    let (status, _) = post_json(
        app.router(),
        "/generate-embed-url",
        &[],
        json!({"workbook_id": "wb-1"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
