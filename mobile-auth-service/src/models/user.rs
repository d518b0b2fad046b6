//! User profile records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationMethod {
    Email,
    Phone,
}

impl RegistrationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationMethod::Email => "email",
            RegistrationMethod::Phone => "phone",
        }
    }
}

/// A user profile, lazily created on first successful credential
/// verification. `user_id` is immutable once assigned to an email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub registration_method: RegistrationMethod,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    pub expiration_date: Option<mongodb::bson::DateTime>,
    #[serde(default)]
    pub deactivated: bool,
}

impl UserProfile {
    pub fn new(email: String, role: String, method: RegistrationMethod) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4().to_string(),
            email,
            role,
            phone_number: None,
            registration_method: method,
            created_at: now,
            updated_at: now,
            expiration_date: None,
            deactivated: false,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expiration_date {
            Some(expiry) => Utc::now() > expiry.to_chrono(),
            None => false,
        }
    }
}
