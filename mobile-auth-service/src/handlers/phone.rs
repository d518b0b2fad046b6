//! SMS one-time-code endpoints.
//!
//! Both endpoints require the pre-shared platform API key in `X-API-Key`
//! plus a per-request HMAC proof over the email.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::dtos::phone::{PhoneResponse, PhoneValidateRequest, PhoneVerifyRequest};
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

const API_KEY_HEADER: &str = "x-api-key";

fn api_key(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing API key")))
}

/// `POST /phone/validate` - issue a verification code.
#[tracing::instrument(skip(state, headers, req))]
pub async fn validate_phone_number(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<PhoneValidateRequest>,
) -> Result<Json<PhoneResponse>, AppError> {
    let key = api_key(&headers)?;
    state.otp.check_request_proof(key, &req.email, &req.emailhash)?;

    state.otp.issue(&req.phone_number, &req.email).await?;

    Ok(Json(PhoneResponse {
        success: true,
        message: "Verification code sent".to_string(),
    }))
}

/// `POST /phone/verify` - consume a verification code.
#[tracing::instrument(skip(state, headers, req))]
pub async fn verify_phone_number(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<PhoneVerifyRequest>,
) -> Result<(StatusCode, Json<PhoneResponse>), AppError> {
    let key = api_key(&headers)?;
    state.otp.check_request_proof(key, &req.email, &req.emailhash)?;

    state
        .otp
        .verify(&req.phone_number, &req.email, &req.verification_code)
        .await?;

    Ok((
        StatusCode::OK,
        Json(PhoneResponse {
            success: true,
            message: "Phone number verified".to_string(),
        }),
    ))
}
