//! Magic-link issuance and verification.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use validator::ValidateEmail;

use crate::config::{AuthPolicyConfig, SecurityConfig};
use crate::models::{Credential, CredentialDetail, DeliveryChannel, RegistrationMethod};
use crate::services::profile::find_or_create_profile;
use crate::services::{
    EmailProvider, IdentityGuard, IssuedSession, ServiceError, SessionService, SmsProvider,
};
use crate::store::{ConsumeOutcome, CredentialStore, Directory};
use crate::utils::validate_phone;

/// Issuance result. The credential id never travels back to the caller;
/// only the delivery channel carries it.
#[derive(Debug, Clone)]
pub struct IssuedLink {
    pub expires_in: i64,
}

/// Verification result: a fresh session plus the flow context the link
/// carried.
#[derive(Debug, Clone)]
pub struct VerifiedLink {
    pub session: IssuedSession,
    pub dashboard_id: Option<String>,
}

#[derive(Clone)]
pub struct MagicLinkService {
    credentials: Arc<dyn CredentialStore>,
    directory: Arc<dyn Directory>,
    guard: IdentityGuard,
    email: Arc<dyn EmailProvider>,
    sms: Arc<dyn SmsProvider>,
    sessions: SessionService,
    policy: AuthPolicyConfig,
    security: SecurityConfig,
}

impl MagicLinkService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        directory: Arc<dyn Directory>,
        guard: IdentityGuard,
        email: Arc<dyn EmailProvider>,
        sms: Arc<dyn SmsProvider>,
        sessions: SessionService,
        policy: AuthPolicyConfig,
        security: SecurityConfig,
    ) -> Self {
        Self {
            credentials,
            directory,
            guard,
            email,
            sms,
            sessions,
            policy,
            security,
        }
    }

    /// Mint a magic-link credential and hand the deep link to the email
    /// channel.
    #[tracing::instrument(skip(self))]
    pub async fn request_link(&self, email: &str) -> Result<IssuedLink, ServiceError> {
        if !email.validate_email() {
            return Err(ServiceError::InvalidEmail);
        }

        if self.guard.approval(email).await?.is_none() {
            return Err(ServiceError::NotApproved);
        }

        let credential = Credential::new_magic_link(
            email.to_string(),
            DeliveryChannel::Email,
            None,
            self.policy.magic_link_ttl_seconds,
        );
        self.credentials.insert_credential(&credential).await?;

        // The credential stays valid if delivery fails; a retry re-sends
        // without regenerating it at the store level.
        let link = self.deep_link(&credential.id);
        self.email.send_magic_link(email, &link).await?;

        tracing::info!(channel = "email", "Magic link issued");
        Ok(IssuedLink {
            expires_in: self.policy.magic_link_ttl_seconds,
        })
    }

    /// SMS-handoff variant: a platform-signed request sends the link to the
    /// user's phone instead. Carries the target dashboard as flow context.
    #[tracing::instrument(skip(self, api_key))]
    pub async fn send_to_mobile(
        &self,
        email: &str,
        phone_number: &str,
        api_key: &str,
        dashboard_id: Option<String>,
    ) -> Result<IssuedLink, ServiceError> {
        self.check_api_key(api_key)?;

        if !email.validate_email() {
            return Err(ServiceError::InvalidEmail);
        }
        if !validate_phone(phone_number) {
            return Err(ServiceError::InvalidPhone);
        }

        if self.guard.approval(email).await?.is_none() {
            return Err(ServiceError::NotApproved);
        }

        let credential = Credential::new_magic_link(
            email.to_string(),
            DeliveryChannel::Sms,
            dashboard_id,
            self.policy.magic_link_ttl_seconds,
        );
        self.credentials.insert_credential(&credential).await?;

        let link = self.deep_link(&credential.id);
        self.sms.send_magic_link(phone_number, &link).await?;

        tracing::info!(channel = "sms", "Magic link issued");
        Ok(IssuedLink {
            expires_in: self.policy.magic_link_ttl_seconds,
        })
    }

    /// Consume a magic-link credential and exchange it for a session.
    ///
    /// The conditional mark-used write is the point of consumption: of two
    /// racing verifications, exactly one proceeds.
    #[tracing::instrument(skip(self, token_id))]
    pub async fn verify(
        &self,
        token_id: &str,
        device_id: &str,
    ) -> Result<VerifiedLink, ServiceError> {
        let credential = self
            .credentials
            .find_credential(token_id)
            .await?
            .ok_or(ServiceError::CredentialNotFound)?;

        let dashboard_id = match &credential.detail {
            CredentialDetail::MagicLink { dashboard_id, .. } => dashboard_id.clone(),
            CredentialDetail::Session { .. } => return Err(ServiceError::WrongCredentialKind),
        };

        if credential.used {
            return Err(ServiceError::CredentialUsed);
        }
        if credential.is_expired() {
            return Err(ServiceError::CredentialNotFound);
        }

        match self.credentials.consume_credential(token_id).await? {
            ConsumeOutcome::Consumed(_) => {}
            ConsumeOutcome::AlreadyUsed => return Err(ServiceError::CredentialUsed),
            ConsumeOutcome::NotFound => return Err(ServiceError::CredentialNotFound),
        }

        // Standing may have changed since issuance; account creation is the
        // gate that must fail closed.
        let approval = self
            .guard
            .approval(&credential.email)
            .await?
            .ok_or(ServiceError::NotApproved)?;

        let user = find_or_create_profile(
            &self.directory,
            &credential.email,
            &approval,
            RegistrationMethod::Email,
            None,
        )
        .await?;

        let session = self
            .sessions
            .issue(&user, Some(device_id.to_string()))
            .await?;

        Ok(VerifiedLink {
            session,
            dashboard_id,
        })
    }

    fn check_api_key(&self, presented: &str) -> Result<(), ServiceError> {
        let expected = self.security.mobile_api_key.as_bytes();
        let presented = presented.as_bytes();
        if expected.len() != presented.len() || expected.ct_eq(presented).unwrap_u8() != 1 {
            return Err(ServiceError::InvalidApiKey);
        }
        Ok(())
    }

    fn deep_link(&self, credential_id: &str) -> String {
        format!(
            "{}/auth/verify?token={}",
            self.security.link_base_url.trim_end_matches('/'),
            credential_id
        )
    }
}
