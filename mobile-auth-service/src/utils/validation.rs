use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use service_core::error::AppError;

/// JSON extractor that runs `validator` rules and rejects with the shared
/// error taxonomy (parse failures and rule failures are both input errors).
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", e)))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// E.164 phone check: leading `+`, 8 to 15 digits, nothing else.
pub fn validate_phone(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };
    (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_e164_numbers() {
        assert!(validate_phone("+14155551234"));
        assert!(validate_phone("+447700900123"));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(!validate_phone("14155551234"));
        assert!(!validate_phone("+1-415-555-1234"));
        assert!(!validate_phone("+123"));
        assert!(!validate_phone("+"));
        assert!(!validate_phone(""));
    }
}
