//! Request/response shapes for the SMS one-time-code endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PhoneValidateRequest {
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// Signed-request proof over the email, hex encoded.
    #[validate(length(min = 1, message = "Email hash is required"))]
    pub emailhash: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PhoneVerifyRequest {
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Email hash is required"))]
    pub emailhash: String,
    #[validate(length(min = 1, message = "Verification code is required"))]
    pub verification_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneResponse {
    pub success: bool,
    pub message: String,
}
