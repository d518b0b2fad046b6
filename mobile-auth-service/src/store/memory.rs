//! In-memory store used by tests.
//!
//! Mirrors the conditional-update semantics of the MongoDB implementation so
//! single-use races behave identically under test.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{AllowlistEntry, AuditEvent, Credential, UserProfile, VerificationCode};
use crate::store::{
    AuditSink, ConsumeOutcome, CredentialStore, Directory, HealthCheck, StoreError,
    VerificationCodeStore,
};

#[derive(Default)]
pub struct MemoryStore {
    // BTreeMap so `credentials()` returns a deterministic order for tests.
    credentials: Mutex<BTreeMap<String, Credential>>,
    codes: Mutex<HashMap<String, VerificationCode>>,
    users: Mutex<HashMap<String, UserProfile>>,
    allowlist: Mutex<HashMap<String, AllowlistEntry>>,
    audit: Mutex<Vec<AuditEvent>>,
    directory_failing: AtomicBool,
    audit_failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every directory lookup fail, to exercise fail-open and
    /// fail-closed standing checks.
    pub fn set_directory_failing(&self, failing: bool) {
        self.directory_failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_audit_failing(&self, failing: bool) {
        self.audit_failing.store(failing, Ordering::SeqCst);
    }

    pub fn put_allowlist_entry(&self, entry: AllowlistEntry) {
        self.allowlist
            .lock()
            .unwrap()
            .insert(entry.email.clone(), entry);
    }

    pub fn put_credential(&self, credential: Credential) {
        self.credentials
            .lock()
            .unwrap()
            .insert(credential.id.clone(), credential);
    }

    pub fn put_user(&self, user: UserProfile) {
        self.users
            .lock()
            .unwrap()
            .insert(user.user_id.clone(), user);
    }

    pub fn credentials(&self) -> Vec<Credential> {
        self.credentials.lock().unwrap().values().cloned().collect()
    }

    pub fn codes(&self) -> Vec<VerificationCode> {
        self.codes.lock().unwrap().values().cloned().collect()
    }

    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit.lock().unwrap().clone()
    }

    pub fn allowlist_entry(&self, email: &str) -> Option<AllowlistEntry> {
        self.allowlist.lock().unwrap().get(email).cloned()
    }

    fn directory_guard(&self) -> Result<(), StoreError> {
        if self.directory_failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "injected directory failure"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        self.credentials
            .lock()
            .unwrap()
            .insert(credential.id.clone(), credential.clone());
        Ok(())
    }

    async fn find_credential(&self, id: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials.lock().unwrap().get(id).cloned())
    }

    async fn consume_credential(&self, id: &str) -> Result<ConsumeOutcome, StoreError> {
        let mut credentials = self.credentials.lock().unwrap();
        match credentials.get_mut(id) {
            Some(credential) if !credential.used => {
                let before = credential.clone();
                credential.used = true;
                credential.used_at = Some(mongodb::bson::DateTime::now());
                Ok(ConsumeOutcome::Consumed(before))
            }
            Some(_) => Ok(ConsumeOutcome::AlreadyUsed),
            None => Ok(ConsumeOutcome::NotFound),
        }
    }
}

#[async_trait]
impl VerificationCodeStore for MemoryStore {
    async fn insert_code(&self, code: &VerificationCode) -> Result<(), StoreError> {
        self.codes
            .lock()
            .unwrap()
            .insert(code.id.clone(), code.clone());
        Ok(())
    }

    async fn list_codes(
        &self,
        phone_number: &str,
        email: &str,
    ) -> Result<Vec<VerificationCode>, StoreError> {
        let mut matches: Vec<VerificationCode> = self
            .codes
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.phone_number == phone_number && c.email == email)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn invalidate_code(&self, id: &str) -> Result<(), StoreError> {
        if let Some(code) = self.codes.lock().unwrap().get_mut(id) {
            code.invalidated_at = Some(mongodb::bson::DateTime::now());
        }
        Ok(())
    }

    async fn mark_code_used(&self, id: &str) -> Result<bool, StoreError> {
        let mut codes = self.codes.lock().unwrap();
        match codes.get_mut(id) {
            Some(code) if !code.used => {
                code.used = true;
                code.used_at = Some(mongodb::bson::DateTime::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        self.directory_guard()?;
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        self.directory_guard()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        self.directory_guard()?;
        self.users
            .lock()
            .unwrap()
            .insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        self.directory_guard()?;
        self.users
            .lock()
            .unwrap()
            .insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn find_allowlist_entry(
        &self,
        email: &str,
    ) -> Result<Option<AllowlistEntry>, StoreError> {
        self.directory_guard()?;
        Ok(self.allowlist.lock().unwrap().get(email).cloned())
    }

    async fn mark_allowlist_registered(&self, email: &str) -> Result<(), StoreError> {
        self.directory_guard()?;
        if let Some(entry) = self.allowlist.lock().unwrap().get_mut(email) {
            if entry.registered_at.is_none() {
                entry.registered_at = Some(mongodb::bson::DateTime::now());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn record_event(&self, event: &AuditEvent) -> Result<(), StoreError> {
        if self.audit_failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "injected audit failure"
            )));
        }
        self.audit.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn check(&self) -> bool {
        true
    }
}
