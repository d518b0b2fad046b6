//! Durable store abstractions.
//!
//! The service is stateless between calls; everything durable lives behind
//! these traits. The store must provide read-your-writes consistency and
//! atomic single-record updates; no multi-record transactions are required.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AllowlistEntry, AuditEvent, Credential, UserProfile, VerificationCode};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(anyhow::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(anyhow::Error::new(err))
    }
}

/// Outcome of a conditional consume.
#[derive(Debug)]
pub enum ConsumeOutcome {
    /// This caller won the transition; the returned record is the
    /// pre-consumption state.
    Consumed(Credential),
    /// The record exists but `used` was already true.
    AlreadyUsed,
    NotFound,
}

/// One-time credential records keyed by opaque id.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert_credential(&self, credential: &Credential) -> Result<(), StoreError>;

    async fn find_credential(&self, id: &str) -> Result<Option<Credential>, StoreError>;

    /// Atomically flip `used` from false to true. This conditional write is
    /// the sole enforcement of single-use semantics: of two racing callers,
    /// exactly one observes `Consumed`.
    async fn consume_credential(&self, id: &str) -> Result<ConsumeOutcome, StoreError>;
}

/// SMS verification codes with a secondary lookup by (phone, email).
#[async_trait]
pub trait VerificationCodeStore: Send + Sync {
    async fn insert_code(&self, code: &VerificationCode) -> Result<(), StoreError>;

    /// All codes for the pair, newest first.
    async fn list_codes(
        &self,
        phone_number: &str,
        email: &str,
    ) -> Result<Vec<VerificationCode>, StoreError>;

    async fn invalidate_code(&self, id: &str) -> Result<(), StoreError>;

    /// Conditionally mark a code used; returns false if it already was.
    async fn mark_code_used(&self, id: &str) -> Result<bool, StoreError>;
}

/// User profiles and the allow-list.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError>;

    async fn insert_user(&self, user: &UserProfile) -> Result<(), StoreError>;

    async fn update_user(&self, user: &UserProfile) -> Result<(), StoreError>;

    async fn find_allowlist_entry(
        &self,
        email: &str,
    ) -> Result<Option<AllowlistEntry>, StoreError>;

    /// Stamp `registered_at` on an allow-list entry. First write wins;
    /// later calls are no-ops.
    async fn mark_allowlist_registered(&self, email: &str) -> Result<(), StoreError>;
}

/// Best-effort audit sink.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_event(&self, event: &AuditEvent) -> Result<(), StoreError>;
}

/// Liveness probe against the backing store.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> bool;
}
