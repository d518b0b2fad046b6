//! Embed-URL generation endpoint.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};

use crate::dtos::embed::{GenerateEmbedUrlRequest, GenerateEmbedUrlResponse};
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing bearer token")))
}

/// `POST /generate-embed-url`
#[tracing::instrument(skip(state, headers, req))]
pub async fn generate_embed_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<GenerateEmbedUrlRequest>,
) -> Result<Json<GenerateEmbedUrlResponse>, AppError> {
    let session_token = bearer_token(&headers)?;

    let grant = state.embed.generate(session_token, req.into()).await?;

    Ok(Json(GenerateEmbedUrlResponse {
        success: true,
        url: grant.url,
        jwt: grant.jwt,
        expires_at: grant.expires_at,
    }))
}
