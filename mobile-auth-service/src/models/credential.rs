//! One-time credential records.
//!
//! A credential is a single-use, time-bounded secret proving control of an
//! email or phone channel. Two kinds share one store keyed by opaque id:
//! magic links (verified and consumed by the client) and session registry
//! entries (written already-consumed, kept for traceability only).

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Channel a credential was delivered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    Email,
    Sms,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryChannel::Email => "email",
            DeliveryChannel::Sms => "sms",
        }
    }
}

/// Kind-specific credential payload.
///
/// Tagged so each variant carries only its own fields; the `kind` tag is
/// what lands in the store document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialDetail {
    MagicLink {
        channel: DeliveryChannel,
        #[serde(skip_serializing_if = "Option::is_none")]
        dashboard_id: Option<String>,
    },
    Session {
        /// The signed session artifact this registry entry records.
        artifact: String,
    },
}

impl CredentialDetail {
    /// Id prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            CredentialDetail::MagicLink { .. } => "ml",
            CredentialDetail::Session { .. } => "sess",
        }
    }
}

/// A one-time credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<mongodb::bson::DateTime>,
    #[serde(flatten)]
    pub detail: CredentialDetail,
}

impl Credential {
    /// Create an unused magic-link credential with the given time to live.
    pub fn new_magic_link(
        email: String,
        channel: DeliveryChannel,
        dashboard_id: Option<String>,
        ttl_seconds: i64,
    ) -> Self {
        let now = Utc::now();
        let detail = CredentialDetail::MagicLink {
            channel,
            dashboard_id,
        };
        Self {
            id: random_id(detail.prefix()),
            email,
            user_id: None,
            device_id: None,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
            used: false,
            used_at: None,
            detail,
        }
    }

    /// Create a session registry entry. Written already consumed; it is an
    /// audit record, never looked up for verification.
    pub fn new_session_record(
        email: String,
        user_id: String,
        device_id: Option<String>,
        artifact: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        let detail = CredentialDetail::Session { artifact };
        Self {
            id: random_id(detail.prefix()),
            email,
            user_id: Some(user_id),
            device_id,
            created_at: now,
            expires_at,
            used: true,
            used_at: Some(mongodb::bson::DateTime::from_chrono(now)),
            detail,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Generate a prefixed, unguessable credential id.
fn random_id(prefix: &str) -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill(&mut bytes);
    format!("{}_{}", prefix, hex::encode(bytes))
}
