//! Signed token minting and verification.
//!
//! Both the long-lived session artifact and the short-lived embed token are
//! three-part JWTs signed with a symmetric MAC (HS256) over secrets held by
//! the process-wide cache.

use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::services::{SecretCache, ServiceError};

pub const SESSION_KEY_ID: &str = "mobile-session-v1";
pub const EMBED_KEY_ID: &str = "embed-v1";

/// Claims for the long-lived session artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id).
    pub sub: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Claims for the downstream embed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedClaims {
    /// Subject: the tagged embed identity, not the raw email.
    pub sub: String,
    pub iss: String,
    pub aud: String,
    /// Fresh random nonce.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub ver: String,
    pub account_type: String,
    pub teams: Vec<String>,
    /// Caller-supplied variable payload, carried verbatim.
    pub user_attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workbook_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_path: Option<String>,
}

#[derive(Clone)]
pub struct TokenService {
    secrets: Arc<SecretCache>,
}

impl TokenService {
    pub fn new(secrets: Arc<SecretCache>) -> Self {
        Self { secrets }
    }

    pub async fn sign_session(&self, claims: &SessionClaims) -> Result<String, ServiceError> {
        let secret = self.secrets.session_secret().await?;
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(SESSION_KEY_ID.to_string());

        encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to sign session: {}", e)))
    }

    /// Verify signature and expiry. Any failure collapses to an
    /// unauthenticated error; callers never learn which check failed.
    pub async fn verify_session(&self, token: &str) -> Result<SessionClaims, ServiceError> {
        let secret = self.secrets.session_secret().await?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| ServiceError::SessionInvalid)
    }

    pub async fn sign_embed(&self, claims: &EmbedClaims) -> Result<String, ServiceError> {
        let secret = self.secrets.embed_secret().await?;
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(EMBED_KEY_ID.to_string());

        encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes())).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Failed to sign embed token: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StaticSecrets;
    use chrono::Utc;

    fn token_service() -> TokenService {
        let secrets = Arc::new(SecretCache::new(
            Arc::new(
                StaticSecrets::new()
                    .with("session", "session-secret")
                    .with("embed", "embed-secret"),
            ),
            "session".to_string(),
            "embed".to_string(),
        ));
        TokenService::new(secrets)
    }

    #[tokio::test]
    async fn session_sign_and_verify_round_trip() {
        let tokens = token_service();
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: "user-1".to_string(),
            email: "a@example.com".to_string(),
            device_id: Some("device-1".to_string()),
            iat: now,
            exp: now + 3600,
        };

        let token = tokens.sign_session(&claims).await.unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = tokens.verify_session(&token).await.unwrap();
        assert_eq!(decoded.sub, "user-1");
        assert_eq!(decoded.device_id.as_deref(), Some("device-1"));
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let tokens = token_service();
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: "user-1".to_string(),
            email: "a@example.com".to_string(),
            device_id: None,
            iat: now - 7200,
            exp: now - 3600,
        };

        let token = tokens.sign_session(&claims).await.unwrap();
        assert!(matches!(
            tokens.verify_session(&token).await,
            Err(ServiceError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn tampered_session_is_rejected() {
        let tokens = token_service();
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: "user-1".to_string(),
            email: "a@example.com".to_string(),
            device_id: None,
            iat: now,
            exp: now + 3600,
        };

        let token = tokens.sign_session(&claims).await.unwrap();
        let tampered = format!("{}x", token);
        assert!(tokens.verify_session(&tampered).await.is_err());
    }

    #[tokio::test]
    async fn embed_tokens_use_the_embed_secret() {
        let tokens = token_service();
        let now = Utc::now().timestamp();
        let claims = EmbedClaims {
            sub: "a+embed@example.com".to_string(),
            iss: "mobile-auth".to_string(),
            aud: "dashboards".to_string(),
            jti: "nonce-1".to_string(),
            iat: now,
            exp: now + 3600,
            ver: "1.1".to_string(),
            account_type: "viewer".to_string(),
            teams: vec!["mobile".to_string()],
            user_attributes: serde_json::Map::new(),
            workbook_id: Some("wb-1".to_string()),
            page_id: None,
            embed_path: None,
        };

        let token = tokens.sign_embed(&claims).await.unwrap();
        // An embed token must not verify as a session artifact.
        assert!(tokens.verify_session(&token).await.is_err());
    }
}
