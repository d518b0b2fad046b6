use service_core::error::AppError;
use thiserror::Error;

use crate::store::StoreError;

/// Domain-level failures. Converted to `AppError` at the handler boundary;
/// the mapping fixes the HTTP status and the coarseness of each message.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid phone number")]
    InvalidPhone,

    #[error("Account not approved")]
    NotApproved,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid request signature")]
    InvalidRequestSignature,

    #[error("Magic link not found or expired")]
    CredentialNotFound,

    #[error("Magic link already used")]
    CredentialUsed,

    #[error("Credential is of the wrong type")]
    WrongCredentialKind,

    #[error("Invalid or expired session")]
    SessionInvalid,

    // Deliberately merges wrong-code and expired-code.
    #[error("Verification code not found or expired")]
    CodeNotFound,

    #[error("Verification code already used")]
    CodeUsed,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Account has expired")]
    AccountExpired,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => AppError::StoreError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::Delivery(e) => AppError::DeliveryError(e),
            ServiceError::InvalidEmail => {
                AppError::BadRequest(anyhow::anyhow!("Invalid email address"))
            }
            ServiceError::InvalidPhone => AppError::BadRequest(anyhow::anyhow!(
                "Invalid phone number. Use E.164 format (+1234567890)"
            )),
            ServiceError::NotApproved => {
                AppError::Forbidden(anyhow::anyhow!("Account not approved"))
            }
            ServiceError::InvalidApiKey => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid API key"))
            }
            ServiceError::InvalidRequestSignature => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid request signature"))
            }
            ServiceError::CredentialNotFound => {
                AppError::NotFound(anyhow::anyhow!("Magic link not found or expired"))
            }
            ServiceError::CredentialUsed => {
                AppError::BadRequest(anyhow::anyhow!("Magic link already used"))
            }
            ServiceError::WrongCredentialKind => {
                AppError::BadRequest(anyhow::anyhow!("Credential is of the wrong type"))
            }
            ServiceError::SessionInvalid => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid or expired session"))
            }
            ServiceError::CodeNotFound => {
                AppError::NotFound(anyhow::anyhow!("Verification code not found or expired"))
            }
            ServiceError::CodeUsed => {
                AppError::BadRequest(anyhow::anyhow!("Verification code already used"))
            }
            ServiceError::AccountDeactivated => {
                AppError::Forbidden(anyhow::anyhow!("Account is deactivated"))
            }
            ServiceError::AccountExpired => {
                AppError::Forbidden(anyhow::anyhow!("Account has expired"))
            }
        }
    }
}
