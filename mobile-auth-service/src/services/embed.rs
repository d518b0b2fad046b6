//! Downstream embed-token issuance.
//!
//! Exchanges a verified session for a short-lived, narrowly-scoped token for
//! the third-party embedded dashboard, after re-checking account standing
//! against the current profile.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::{AuthPolicyConfig, EmbedConfig};
use crate::models::{AuditAction, AuditEvent};
use crate::services::{
    EmbedClaims, IdentityGuard, ServiceError, StandingPolicy, TokenService,
};
use crate::store::AuditSink;

/// Target-resource payload, carried into the token verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedRequest {
    pub workbook_id: String,
    pub merchant_id: Option<String>,
    pub embed_path: Option<String>,
    pub teams: Option<Vec<String>>,
    pub applet_id: Option<String>,
    pub applet_name: Option<String>,
    pub page_id: Option<String>,
    pub variables: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub struct EmbedGrant {
    pub url: String,
    pub jwt: String,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct EmbedService {
    guard: IdentityGuard,
    tokens: TokenService,
    audit: Arc<dyn AuditSink>,
    embed: EmbedConfig,
    policy: AuthPolicyConfig,
}

impl EmbedService {
    pub fn new(
        guard: IdentityGuard,
        tokens: TokenService,
        audit: Arc<dyn AuditSink>,
        embed: EmbedConfig,
        policy: AuthPolicyConfig,
    ) -> Self {
        Self {
            guard,
            tokens,
            audit,
            embed,
            policy,
        }
    }

    #[tracing::instrument(skip(self, session_token, req), fields(workbook_id = %req.workbook_id))]
    pub async fn generate(
        &self,
        session_token: &str,
        req: EmbedRequest,
    ) -> Result<EmbedGrant, ServiceError> {
        let claims = self.tokens.verify_session(session_token).await?;

        // Session claims may be stale; re-check standing against the current
        // profile. Availability wins over this layer: lookup failures allow.
        if self
            .guard
            .is_deactivated(&claims.sub, StandingPolicy::FailOpen)
            .await?
        {
            return Err(ServiceError::AccountDeactivated);
        }
        if self
            .guard
            .is_expired(&claims.sub, StandingPolicy::FailOpen)
            .await?
        {
            return Err(ServiceError::AccountExpired);
        }

        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.policy.embed_ttl_seconds);

        let mut user_attributes = req.variables.clone().unwrap_or_default();
        if let Some(merchant_id) = &req.merchant_id {
            user_attributes.insert("merchant_id".to_string(), merchant_id.clone().into());
        }
        if let Some(applet_id) = &req.applet_id {
            user_attributes.insert("applet_id".to_string(), applet_id.clone().into());
        }
        if let Some(applet_name) = &req.applet_name {
            user_attributes.insert("applet_name".to_string(), applet_name.clone().into());
        }

        let embed_claims = EmbedClaims {
            sub: embed_identity(&claims.email, &self.embed.tag),
            iss: self.embed.issuer.clone(),
            aud: self.embed.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            ver: self.embed.version.clone(),
            account_type: self.embed.account_type.clone(),
            teams: req
                .teams
                .clone()
                .unwrap_or_else(|| self.embed.default_teams.clone()),
            user_attributes,
            workbook_id: Some(req.workbook_id.clone()),
            page_id: req.page_id.clone(),
            embed_path: req.embed_path.clone(),
        };
        let jwt = self.tokens.sign_embed(&embed_claims).await?;

        let url = self.embed_url(&req, &jwt)?;

        // Best-effort, non-blocking; failure never fails the request.
        let event = AuditEvent::new(
            AuditAction::EmbedUrlGenerated,
            Some(claims.sub.clone()),
            claims.email.clone(),
            Some(req.workbook_id.clone()),
        );
        let audit = self.audit.clone();
        tokio::spawn(async move {
            if let Err(e) = audit.record_event(&event).await {
                tracing::warn!(error = %e, "Failed to record embed audit event");
            }
        });

        Ok(EmbedGrant {
            url,
            jwt,
            expires_at: expires_at.timestamp(),
        })
    }

    fn embed_url(&self, req: &EmbedRequest, jwt: &str) -> Result<String, ServiceError> {
        let base = self.embed.base_url.trim_end_matches('/');
        let path = match &req.embed_path {
            Some(path) => path.trim_matches('/').to_string(),
            None => format!("workbook/{}", req.workbook_id),
        };

        let query = serde_urlencoded::to_string([(":jwt", jwt), (":embed", "true")])
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))?;

        Ok(format!("{}/{}?{}", base, path, query))
    }
}

/// Deterministic, idempotent embed identity: insert the tag into the local
/// part of the email unless already present.
pub fn embed_identity(email: &str, tag: &str) -> String {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return email.to_string();
    };
    if local.split('+').skip(1).any(|part| part == tag) {
        return email.to_string();
    }
    format!("{}+{}@{}", local, tag, domain)
}
