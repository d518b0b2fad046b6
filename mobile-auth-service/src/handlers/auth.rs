//! Magic-link and session endpoints.

use axum::{extract::State, Json};

use crate::dtos::auth::{
    MagicLinkRequest, MagicLinkResponse, RefreshRequest, RefreshResponse, SendToMobileRequest,
    SessionUser, VerifyMagicLinkRequest, VerifyMagicLinkResponse,
};
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

/// `POST /auth/request-magic-link`
#[tracing::instrument(skip(state, req))]
pub async fn request_magic_link(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<MagicLinkRequest>,
) -> Result<Json<MagicLinkResponse>, AppError> {
    let issued = state.magic_links.request_link(&req.email).await?;

    Ok(Json(MagicLinkResponse {
        success: true,
        expires_in: issued.expires_in,
    }))
}

/// `POST /auth/send-to-mobile`
#[tracing::instrument(skip(state, req))]
pub async fn send_to_mobile(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SendToMobileRequest>,
) -> Result<Json<MagicLinkResponse>, AppError> {
    let issued = state
        .magic_links
        .send_to_mobile(&req.email, &req.phone_number, &req.api_key, req.dashboard_id)
        .await?;

    Ok(Json(MagicLinkResponse {
        success: true,
        expires_in: issued.expires_in,
    }))
}

/// `POST /auth/verify-magic-link`
#[tracing::instrument(skip(state, req))]
pub async fn verify_magic_link(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyMagicLinkRequest>,
) -> Result<Json<VerifyMagicLinkResponse>, AppError> {
    let verified = state.magic_links.verify(&req.token, &req.device_id).await?;

    Ok(Json(VerifyMagicLinkResponse {
        success: true,
        token: verified.session.token,
        expires_at: verified.session.expires_at,
        user: SessionUser {
            user_id: verified.session.user_id,
            email: verified.session.email,
        },
        dashboard_id: verified.dashboard_id,
    }))
}

/// `POST /auth/refresh-token`
#[tracing::instrument(skip(state, req))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let session = state.sessions.refresh(&req.token).await?;

    Ok(Json(RefreshResponse {
        success: true,
        token: session.token,
        expires_at: session.expires_at,
    }))
}
