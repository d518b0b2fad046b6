//! Allow-list entries gating account creation and standing.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// An approved identity. Presence here (or a trusted-domain email) is
/// necessary for account creation and every subsequent standing check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowlistEntry {
    #[serde(rename = "_id")]
    pub email: String,
    /// Optional role override applied at profile creation.
    pub role: Option<String>,
    pub expiration_date: Option<mongodb::bson::DateTime>,
    /// Set once, first write wins.
    pub registered_at: Option<mongodb::bson::DateTime>,
}

impl AllowlistEntry {
    pub fn is_expired(&self) -> bool {
        match self.expiration_date {
            Some(expiry) => Utc::now() > expiry.to_chrono(),
            None => false,
        }
    }
}
