//! SMS one-time-code issuance and verification.

use std::sync::Arc;

use rand::Rng;
use subtle::ConstantTimeEq;
use validator::ValidateEmail;

use crate::config::{AuthPolicyConfig, SecurityConfig};
use crate::models::{RegistrationMethod, VerificationCode, CODE_MAX, CODE_MIN};
use crate::services::profile::find_or_create_profile;
use crate::services::{IdentityGuard, ServiceError, SmsProvider};
use crate::store::{Directory, VerificationCodeStore};
use crate::utils::validate_phone;
use service_core::utils::signature::verify_email_signature;

#[derive(Clone)]
pub struct OtpService {
    codes: Arc<dyn VerificationCodeStore>,
    directory: Arc<dyn Directory>,
    guard: IdentityGuard,
    sms: Arc<dyn SmsProvider>,
    policy: AuthPolicyConfig,
    security: SecurityConfig,
}

impl OtpService {
    pub fn new(
        codes: Arc<dyn VerificationCodeStore>,
        directory: Arc<dyn Directory>,
        guard: IdentityGuard,
        sms: Arc<dyn SmsProvider>,
        policy: AuthPolicyConfig,
        security: SecurityConfig,
    ) -> Self {
        Self {
            codes,
            directory,
            guard,
            sms,
            policy,
            security,
        }
    }

    /// Check the pre-shared API key and the signed-request proof
    /// (`hex(HMAC-SHA256(api_key, email))`).
    pub fn check_request_proof(
        &self,
        api_key: &str,
        email: &str,
        email_hash: &str,
    ) -> Result<(), ServiceError> {
        let expected = self.security.mobile_api_key.as_bytes();
        let presented = api_key.as_bytes();
        if expected.len() != presented.len() || expected.ct_eq(presented).unwrap_u8() != 1 {
            return Err(ServiceError::InvalidApiKey);
        }

        let valid = verify_email_signature(&self.security.mobile_api_key, email, email_hash)
            .map_err(ServiceError::Internal)?;
        if !valid {
            return Err(ServiceError::InvalidRequestSignature);
        }
        Ok(())
    }

    /// Issue a fresh code for the (phone, email) pair.
    ///
    /// All currently-live codes for the pair are invalidated first, so only
    /// the newest code can ever succeed. Invalidation failures are logged
    /// and do not abort issuance; the verifier re-checks per candidate.
    #[tracing::instrument(skip(self))]
    pub async fn issue(&self, phone_number: &str, email: &str) -> Result<(), ServiceError> {
        if !validate_phone(phone_number) {
            return Err(ServiceError::InvalidPhone);
        }
        if !email.validate_email() {
            return Err(ServiceError::InvalidEmail);
        }

        let existing = self.codes.list_codes(phone_number, email).await?;
        for code in existing.iter().filter(|c| c.is_live()) {
            if let Err(e) = self.codes.invalidate_code(&code.id).await {
                tracing::warn!(code_id = %code.id, error = %e, "Failed to invalidate superseded code");
            }
        }

        let value = rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX).to_string();
        let code = VerificationCode::new(
            phone_number.to_string(),
            email.to_string(),
            value.clone(),
            self.policy.otp_ttl_seconds,
        );
        self.codes.insert_code(&code).await?;

        self.sms.send_verification_code(phone_number, &value).await?;

        tracing::info!(superseded = existing.len(), "Verification code issued");
        Ok(())
    }

    /// Verify a presented code.
    ///
    /// Scans the pair's codes newest-first for one that is unexpired, not
    /// superseded, and string-equal to the presented value. Wrong-code and
    /// expired-code are indistinguishable to the caller; a consumed code is
    /// reported as already used.
    #[tracing::instrument(skip(self, presented))]
    pub async fn verify(
        &self,
        phone_number: &str,
        email: &str,
        presented: &str,
    ) -> Result<(), ServiceError> {
        if !validate_phone(phone_number) {
            return Err(ServiceError::InvalidPhone);
        }

        let codes = self.codes.list_codes(phone_number, email).await?;
        let matched = codes
            .iter()
            .find(|c| c.invalidated_at.is_none() && !c.is_expired() && c.code == presented)
            .ok_or(ServiceError::CodeNotFound)?;
        if matched.used {
            return Err(ServiceError::CodeUsed);
        }

        // Allow-list membership may have changed since issuance; this is an
        // account-creation gate, so it fails closed.
        let approval = self
            .guard
            .approval(email)
            .await?
            .ok_or(ServiceError::NotApproved)?;

        find_or_create_profile(
            &self.directory,
            email,
            &approval,
            RegistrationMethod::Phone,
            Some(phone_number),
        )
        .await?;

        if !self.codes.mark_code_used(&matched.id).await? {
            return Err(ServiceError::CodeUsed);
        }

        tracing::info!("Verification code accepted");
        Ok(())
    }
}
