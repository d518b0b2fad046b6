//! Audit events for traceability of token issuance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    EmbedUrlGenerated,
    SessionRefreshed,
}

/// Best-effort audit record. Recording failures are logged, never surfaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(rename = "_id")]
    pub id: String,
    pub action: AuditAction,
    pub user_id: Option<String>,
    pub email: String,
    pub resource_id: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        user_id: Option<String>,
        email: String,
        resource_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            action,
            user_id,
            email,
            resource_id,
            created_at: Utc::now(),
        }
    }
}
