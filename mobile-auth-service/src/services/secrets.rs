//! Process-wide signing-secret cache.
//!
//! Two signing secrets (session, embed) are fetched from a secret source at
//! most once per process lifetime and memoized. Concurrent first-time
//! fetches may both hit the source; that is idempotent and acceptable. No
//! cross-process coordination.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::services::ServiceError;

/// Where secrets come from. Injected so tests substitute a fixed source.
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn fetch_secret(&self, name: &str) -> Result<String, ServiceError>;
}

/// Reads secrets from environment variables, the deployment's injection
/// mechanism of choice.
pub struct EnvSecretSource;

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn fetch_secret(&self, name: &str) -> Result<String, ServiceError> {
        std::env::var(name)
            .map_err(|_| ServiceError::Internal(anyhow::anyhow!("Secret {} not available", name)))
    }
}

/// Fixed in-memory secrets for tests.
#[derive(Default)]
pub struct StaticSecrets {
    secrets: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.secrets.insert(name.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl SecretSource for StaticSecrets {
    async fn fetch_secret(&self, name: &str) -> Result<String, ServiceError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("Secret {} not available", name)))
    }
}

/// Memoizing cache over a `SecretSource` for the two signing secrets.
pub struct SecretCache {
    source: Arc<dyn SecretSource>,
    session_name: String,
    embed_name: String,
    session: OnceCell<String>,
    embed: OnceCell<String>,
}

impl SecretCache {
    pub fn new(source: Arc<dyn SecretSource>, session_name: String, embed_name: String) -> Self {
        Self {
            source,
            session_name,
            embed_name,
            session: OnceCell::new(),
            embed: OnceCell::new(),
        }
    }

    pub async fn session_secret(&self) -> Result<&str, ServiceError> {
        self.session
            .get_or_try_init(|| self.source.fetch_secret(&self.session_name))
            .await
            .map(String::as_str)
    }

    pub async fn embed_secret(&self) -> Result<&str, ServiceError> {
        self.embed
            .get_or_try_init(|| self.source.fetch_secret(&self.embed_name))
            .await
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SecretSource for CountingSource {
        async fn fetch_secret(&self, _name: &str) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("secret-value".to_string())
        }
    }

    #[tokio::test]
    async fn secret_is_fetched_at_most_once() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let cache = SecretCache::new(
            source.clone(),
            "session".to_string(),
            "embed".to_string(),
        );

        for _ in 0..5 {
            assert_eq!(cache.session_secret().await.unwrap(), "secret-value");
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        cache.embed_secret().await.unwrap();
        cache.embed_secret().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_secret_surfaces_error_and_is_retried() {
        let cache = SecretCache::new(
            Arc::new(StaticSecrets::new().with("embed", "e")),
            "session".to_string(),
            "embed".to_string(),
        );
        assert!(cache.session_secret().await.is_err());
        assert_eq!(cache.embed_secret().await.unwrap(), "e");
    }
}
