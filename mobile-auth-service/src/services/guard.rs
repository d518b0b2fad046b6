//! Shared standing checks.
//!
//! Every issuance and exchange path funnels through these. Whether a lookup
//! failure denies or allows is an explicit per-call-site policy: account
//! creation gates fail closed, post-authentication re-checks fail open.

use std::sync::Arc;

use crate::services::ServiceError;
use crate::store::{Directory, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandingPolicy {
    /// A lookup failure allows the request (availability over this layer).
    FailOpen,
    /// A lookup failure surfaces as a server error and denies nothing
    /// silently; absence still denies.
    FailClosed,
}

/// An identity that passed the approval gate.
#[derive(Debug, Clone)]
pub struct Approval {
    /// Role override from the allow-list entry, if any.
    pub role: Option<String>,
    /// True when approval came from the trusted domain, with no allow-list
    /// lookup at all.
    pub via_trusted_domain: bool,
}

#[derive(Clone)]
pub struct IdentityGuard {
    directory: Arc<dyn Directory>,
    trusted_domain: String,
}

impl IdentityGuard {
    pub fn new(directory: Arc<dyn Directory>, trusted_domain: String) -> Self {
        Self {
            directory,
            trusted_domain,
        }
    }

    /// Approval gate: trusted-domain emails pass unconditionally; everyone
    /// else needs a live allow-list entry. Returns `None` when not approved.
    pub async fn approval(&self, email: &str) -> Result<Option<Approval>, ServiceError> {
        if self.is_trusted_domain(email) {
            return Ok(Some(Approval {
                role: None,
                via_trusted_domain: true,
            }));
        }

        let entry = self.directory.find_allowlist_entry(email).await?;
        match entry {
            Some(entry) if !entry.is_expired() => Ok(Some(Approval {
                role: entry.role.clone(),
                via_trusted_domain: false,
            })),
            _ => Ok(None),
        }
    }

    pub async fn is_approved(&self, email: &str) -> Result<bool, ServiceError> {
        Ok(self.approval(email).await?.is_some())
    }

    /// Whether the account is deactivated, consulting the current profile.
    pub async fn is_deactivated(
        &self,
        user_id: &str,
        policy: StandingPolicy,
    ) -> Result<bool, ServiceError> {
        match self.directory.find_user_by_id(user_id).await {
            Ok(Some(user)) => Ok(user.deactivated),
            Ok(None) => Ok(false),
            Err(e) => self.on_lookup_failure(e, policy, user_id, "deactivation"),
        }
    }

    /// Whether the account is past its expiration date.
    pub async fn is_expired(
        &self,
        user_id: &str,
        policy: StandingPolicy,
    ) -> Result<bool, ServiceError> {
        match self.directory.find_user_by_id(user_id).await {
            Ok(Some(user)) => Ok(user.is_expired()),
            Ok(None) => Ok(false),
            Err(e) => self.on_lookup_failure(e, policy, user_id, "expiration"),
        }
    }

    fn is_trusted_domain(&self, email: &str) -> bool {
        email
            .rsplit_once('@')
            .map(|(_, domain)| domain.eq_ignore_ascii_case(&self.trusted_domain))
            .unwrap_or(false)
    }

    fn on_lookup_failure(
        &self,
        err: StoreError,
        policy: StandingPolicy,
        user_id: &str,
        check: &str,
    ) -> Result<bool, ServiceError> {
        match policy {
            StandingPolicy::FailOpen => {
                tracing::warn!(
                    user_id = %user_id,
                    check = %check,
                    error = %err,
                    "Standing check lookup failed, allowing request"
                );
                Ok(false)
            }
            StandingPolicy::FailClosed => Err(ServiceError::Store(err)),
        }
    }
}
