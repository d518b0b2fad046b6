//! Session issuance and refresh.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::models::{Credential, UserProfile};
use crate::services::{ServiceError, SessionClaims, TokenService};
use crate::store::CredentialStore;

/// A signed session artifact with its expiry and minimal identity.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: i64,
    pub user_id: String,
    pub email: String,
}

#[derive(Clone)]
pub struct SessionService {
    credentials: Arc<dyn CredentialStore>,
    tokens: TokenService,
    session_ttl_days: i64,
    refresh_threshold_days: i64,
}

impl SessionService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tokens: TokenService,
        session_ttl_days: i64,
        refresh_threshold_days: i64,
    ) -> Self {
        Self {
            credentials,
            tokens,
            session_ttl_days,
            refresh_threshold_days,
        }
    }

    /// Issue a fresh session for a verified user. A session-kind credential
    /// record is persisted alongside, already consumed; it is a registry
    /// entry for traceability and is never looked up for verification.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn issue(
        &self,
        user: &UserProfile,
        device_id: Option<String>,
    ) -> Result<IssuedSession, ServiceError> {
        self.mint(user.user_id.clone(), user.email.clone(), device_id)
            .await
    }

    /// Verify and, if within the refresh window, re-issue a session.
    ///
    /// A session with more than the threshold remaining is returned
    /// unchanged; callers can treat that as "still valid".
    #[tracing::instrument(skip(self, token))]
    pub async fn refresh(&self, token: &str) -> Result<IssuedSession, ServiceError> {
        let claims = self.tokens.verify_session(token).await?;

        let now = Utc::now().timestamp();
        let remaining = claims.exp - now;
        if remaining > self.refresh_threshold_days * 86_400 {
            tracing::debug!(user_id = %claims.sub, "Session outside refresh window, no-op");
            return Ok(IssuedSession {
                token: token.to_string(),
                expires_at: claims.exp,
                user_id: claims.sub,
                email: claims.email,
            });
        }

        self.mint(claims.sub, claims.email, claims.device_id).await
    }

    async fn mint(
        &self,
        user_id: String,
        email: String,
        device_id: Option<String>,
    ) -> Result<IssuedSession, ServiceError> {
        let now = Utc::now();
        let expires_at = now + Duration::days(self.session_ttl_days);

        let claims = SessionClaims {
            sub: user_id.clone(),
            email: email.clone(),
            device_id: device_id.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = self.tokens.sign_session(&claims).await?;

        let record = Credential::new_session_record(
            email.clone(),
            user_id.clone(),
            device_id,
            token.clone(),
            expires_at,
        );
        self.credentials.insert_credential(&record).await?;

        tracing::info!(user_id = %user_id, session_id = %record.id, "Session issued");

        Ok(IssuedSession {
            token,
            expires_at: claims.exp,
            user_id,
            email,
        })
    }
}
