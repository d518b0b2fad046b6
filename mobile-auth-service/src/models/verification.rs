//! SMS verification codes.
//!
//! Distinct from one-time credentials: several live attempts may run against
//! one code, and a newer code explicitly supersedes older ones for the same
//! (phone, email) pair.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inclusive range for generated codes (always 5 decimal digits).
pub const CODE_MIN: u32 = 10_000;
pub const CODE_MAX: u32 = 99_999;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCode {
    #[serde(rename = "_id")]
    pub id: String,
    pub phone_number: String,
    pub email: String,
    /// Stored in plaintext: short-lived and single-use, see the verifier's
    /// scan-compare contract.
    pub code: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<mongodb::bson::DateTime>,
    pub invalidated_at: Option<mongodb::bson::DateTime>,
}

impl VerificationCode {
    pub fn new(phone_number: String, email: String, code: String, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            phone_number,
            email,
            code,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
            used: false,
            used_at: None,
            invalidated_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Live means: usable right now. Superseded, consumed, or expired codes
    /// are not live.
    pub fn is_live(&self) -> bool {
        !self.used && self.invalidated_at.is_none() && !self.is_expired()
    }
}
