//! Request/response shapes for the magic-link and session endpoints.
//!
//! The mobile client speaks camelCase.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendToMobileRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
    #[validate(length(min = 1, message = "API key is required"))]
    pub api_key: String,
    pub dashboard_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkResponse {
    pub success: bool,
    /// Seconds until the link expires.
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyMagicLinkRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 1, message = "Device id is required"))]
    pub device_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyMagicLinkResponse {
    pub success: bool,
    pub token: String,
    /// Unix timestamp of session expiry.
    pub expires_at: i64,
    pub user: SessionUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: i64,
}
