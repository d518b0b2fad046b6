//! Lazy user-profile resolution.
//!
//! Profiles are created on first successful credential verification, never
//! at issuance. Re-authentication of the same email resolves to the same
//! user id.

use std::sync::Arc;

use chrono::Utc;

use crate::models::{RegistrationMethod, UserProfile};
use crate::services::{Approval, ServiceError};
use crate::store::Directory;

const DEFAULT_ROLE: &str = "user";

pub(crate) async fn find_or_create_profile(
    directory: &Arc<dyn Directory>,
    email: &str,
    approval: &Approval,
    method: RegistrationMethod,
    phone_number: Option<&str>,
) -> Result<UserProfile, ServiceError> {
    if let Some(mut user) = directory.find_user_by_email(email).await? {
        if let Some(phone) = phone_number {
            if user.phone_number.as_deref() != Some(phone) {
                user.phone_number = Some(phone.to_string());
                user.updated_at = Utc::now();
                directory.update_user(&user).await?;
            }
        }
        return Ok(user);
    }

    let role = approval
        .role
        .clone()
        .unwrap_or_else(|| DEFAULT_ROLE.to_string());
    let mut user = UserProfile::new(email.to_string(), role, method);
    user.phone_number = phone_number.map(|p| p.to_string());
    directory.insert_user(&user).await?;

    tracing::info!(user_id = %user.user_id, method = %method.as_str(), "User profile created");

    // Bookkeeping stamp, first write wins; not worth failing registration.
    if !approval.via_trusted_domain {
        if let Err(e) = directory.mark_allowlist_registered(email).await {
            tracing::warn!(error = %e, "Failed to stamp allow-list registration");
        }
    }

    Ok(user)
}
