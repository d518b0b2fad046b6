//! MongoDB-backed store.
//!
//! One collection per record type. The mark-used paths use
//! `find_one_and_update` with a `used: false` filter so the unused-to-used
//! transition is a single atomic conditional write.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database as MongoDatabase, IndexModel};

use crate::models::{AllowlistEntry, AuditEvent, Credential, UserProfile, VerificationCode};
use crate::store::{
    AuditSink, ConsumeOutcome, CredentialStore, Directory, HealthCheck, StoreError,
    VerificationCodeStore,
};

#[derive(Clone)]
pub struct MongoStore {
    db: MongoDatabase,
    credentials: Collection<Credential>,
    codes: Collection<VerificationCode>,
    users: Collection<UserProfile>,
    allowlist: Collection<AllowlistEntry>,
    audit: Collection<AuditEvent>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);

        Ok(Self {
            credentials: db.collection("credentials"),
            codes: db.collection("verification_codes"),
            users: db.collection("users"),
            allowlist: db.collection("allowlist"),
            audit: db.collection("audit_events"),
            db,
        })
    }

    /// Create the indexes the lookup paths rely on.
    pub async fn initialize_indexes(&self) -> Result<(), StoreError> {
        let unique = IndexOptions::builder().unique(true).build();
        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique)
                    .build(),
                None,
            )
            .await?;

        self.codes
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "phone_number": 1, "email": 1, "created_at": -1 })
                    .build(),
                None,
            )
            .await?;

        self.credentials
            .create_index(
                IndexModel::builder().keys(doc! { "email": 1 }).build(),
                None,
            )
            .await?;

        tracing::info!("MongoDB indexes initialized");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MongoStore {
    async fn insert_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        self.credentials.insert_one(credential, None).await?;
        Ok(())
    }

    async fn find_credential(&self, id: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials.find_one(doc! { "_id": id }, None).await?)
    }

    async fn consume_credential(&self, id: &str) -> Result<ConsumeOutcome, StoreError> {
        let used_at = mongodb::bson::DateTime::from_chrono(Utc::now());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();

        let consumed = self
            .credentials
            .find_one_and_update(
                doc! { "_id": id, "used": false },
                doc! { "$set": { "used": true, "used_at": used_at } },
                options,
            )
            .await?;

        match consumed {
            Some(credential) => Ok(ConsumeOutcome::Consumed(credential)),
            // Lost the race or never existed; a second read tells which.
            None => match self.find_credential(id).await? {
                Some(_) => Ok(ConsumeOutcome::AlreadyUsed),
                None => Ok(ConsumeOutcome::NotFound),
            },
        }
    }
}

#[async_trait]
impl VerificationCodeStore for MongoStore {
    async fn insert_code(&self, code: &VerificationCode) -> Result<(), StoreError> {
        self.codes.insert_one(code, None).await?;
        Ok(())
    }

    async fn list_codes(
        &self,
        phone_number: &str,
        email: &str,
    ) -> Result<Vec<VerificationCode>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let cursor = self
            .codes
            .find(
                doc! { "phone_number": phone_number, "email": email },
                options,
            )
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn invalidate_code(&self, id: &str) -> Result<(), StoreError> {
        let invalidated_at = mongodb::bson::DateTime::from_chrono(Utc::now());
        self.codes
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "invalidated_at": invalidated_at } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn mark_code_used(&self, id: &str) -> Result<bool, StoreError> {
        let used_at = mongodb::bson::DateTime::from_chrono(Utc::now());
        let result = self
            .codes
            .update_one(
                doc! { "_id": id, "used": false },
                doc! { "$set": { "used": true, "used_at": used_at } },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }
}

#[async_trait]
impl Directory for MongoStore {
    async fn find_user_by_id(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.find_one(doc! { "_id": user_id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn insert_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        self.users.insert_one(user, None).await?;
        Ok(())
    }

    async fn update_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        self.users
            .replace_one(doc! { "_id": &user.user_id }, user, None)
            .await?;
        Ok(())
    }

    async fn find_allowlist_entry(
        &self,
        email: &str,
    ) -> Result<Option<AllowlistEntry>, StoreError> {
        Ok(self.allowlist.find_one(doc! { "_id": email }, None).await?)
    }

    async fn mark_allowlist_registered(&self, email: &str) -> Result<(), StoreError> {
        let registered_at = mongodb::bson::DateTime::from_chrono(Utc::now());
        // First write wins: only entries without a stamp match the filter.
        self.allowlist
            .update_one(
                doc! { "_id": email, "registered_at": null },
                doc! { "$set": { "registered_at": registered_at } },
                None,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for MongoStore {
    async fn record_event(&self, event: &AuditEvent) -> Result<(), StoreError> {
        self.audit.insert_one(event, None).await?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for MongoStore {
    async fn check(&self) -> bool {
        match self.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Store health check failed");
                false
            }
        }
    }
}
