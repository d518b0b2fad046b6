//! Shared harness for mobile-auth-service integration tests.
//!
//! Everything runs in-process against the in-memory store and mock delivery
//! providers; no network, no external services.

#![allow(dead_code)]

use std::sync::Arc;

use mobile_auth_service::{
    build_router,
    config::{
        AuthConfig, AuthPolicyConfig, EmbedConfig, Environment, MongoConfig, SecretsConfig,
        SecurityConfig, SmsConfig, SmtpConfig,
    },
    models::AllowlistEntry,
    services::{
        EmbedService, IdentityGuard, MagicLinkService, MockEmailService, MockSmsService,
        OtpService, SecretCache, SessionService, StaticSecrets, TokenService,
    },
    store::MemoryStore,
    AppState,
};
use service_core::axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use service_core::config as core_config;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-mobile-api-key";
pub const TEST_SESSION_SECRET: &str = "test-session-secret";
pub const TEST_EMBED_SECRET: &str = "test-embed-secret";
pub const TEST_LINK_BASE: &str = "https://app.example.com";
pub const TEST_EMBED_BASE: &str = "https://dashboards.example.com/embed";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: core_config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "mobile-auth-service".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        mongodb: MongoConfig {
            uri: "mongodb://unused".to_string(),
            database: "unused".to_string(),
        },
        smtp: SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "unused".to_string(),
            password: "unused".to_string(),
            from_email: "noreply@example.com".to_string(),
        },
        sms: SmsConfig {
            api_url: "https://sms.example.com/messages".to_string(),
            api_key: "unused".to_string(),
            from_number: "+10000000000".to_string(),
        },
        secrets: SecretsConfig {
            session_secret_name: "SESSION".to_string(),
            embed_secret_name: "EMBED".to_string(),
        },
        security: SecurityConfig {
            mobile_api_key: TEST_API_KEY.to_string(),
            trusted_domain: "sigmacomputing.com".to_string(),
            link_base_url: TEST_LINK_BASE.to_string(),
        },
        auth: AuthPolicyConfig {
            magic_link_ttl_seconds: 900,
            otp_ttl_seconds: 300,
            session_ttl_days: 30,
            refresh_threshold_days: 7,
            embed_ttl_seconds: 3600,
        },
        embed: EmbedConfig {
            base_url: TEST_EMBED_BASE.to_string(),
            issuer: "mobile-auth-service".to_string(),
            audience: "sigmacomputing".to_string(),
            version: "1.1".to_string(),
            account_type: "viewer".to_string(),
            default_teams: vec!["mobile-embed".to_string()],
            tag: "embed".to_string(),
        },
    }
}

pub struct TestApp {
    pub config: AuthConfig,
    pub store: Arc<MemoryStore>,
    pub email: Arc<MockEmailService>,
    pub sms: Arc<MockSmsService>,
    pub tokens: TokenService,
    pub state: AppState,
}

impl TestApp {
    pub fn spawn() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let email = Arc::new(MockEmailService::new());
        let sms = Arc::new(MockSmsService::new());

        let secrets = Arc::new(SecretCache::new(
            Arc::new(
                StaticSecrets::new()
                    .with("SESSION", TEST_SESSION_SECRET)
                    .with("EMBED", TEST_EMBED_SECRET),
            ),
            config.secrets.session_secret_name.clone(),
            config.secrets.embed_secret_name.clone(),
        ));
        let tokens = TokenService::new(secrets);

        let guard = IdentityGuard::new(store.clone(), config.security.trusted_domain.clone());
        let sessions = SessionService::new(
            store.clone(),
            tokens.clone(),
            config.auth.session_ttl_days,
            config.auth.refresh_threshold_days,
        );
        let magic_links = MagicLinkService::new(
            store.clone(),
            store.clone(),
            guard.clone(),
            email.clone(),
            sms.clone(),
            sessions.clone(),
            config.auth.clone(),
            config.security.clone(),
        );
        let otp = OtpService::new(
            store.clone(),
            store.clone(),
            guard.clone(),
            sms.clone(),
            config.auth.clone(),
            config.security.clone(),
        );
        let embed = EmbedService::new(
            guard,
            tokens.clone(),
            store.clone(),
            config.embed.clone(),
            config.auth.clone(),
        );

        let state = AppState {
            config: config.clone(),
            store_health: store.clone(),
            magic_links,
            otp,
            sessions,
            embed,
        };

        Self {
            config,
            store,
            email,
            sms,
            tokens,
            state,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Put an email on the allow-list with no expiry.
    pub fn approve(&self, email: &str) {
        self.store.put_allowlist_entry(AllowlistEntry {
            email: email.to_string(),
            role: None,
            expiration_date: None,
            registered_at: None,
        });
    }

    /// The HMAC proof the mobile platform sends alongside phone requests.
    pub fn email_proof(&self, email: &str) -> String {
        service_core::utils::signature::email_signature(TEST_API_KEY, email)
            .expect("signature generation")
    }

    /// Extract the credential id from the most recently delivered magic
    /// link (email first, then SMS).
    pub fn last_magic_link_token(&self) -> String {
        let link = self
            .email
            .sent()
            .last()
            .map(|(_, link)| link.clone())
            .or_else(|| self.sms.sent().last().map(|(_, text)| text.clone()))
            .expect("no magic link delivered");
        link.rsplit_once("token=")
            .map(|(_, token)| token.to_string())
            .expect("delivered link carries no token")
    }

    /// The last SMS body, which for OTP issuance is the bare code.
    pub fn last_sms_code(&self) -> String {
        self.sms
            .sent()
            .last()
            .map(|(_, text)| text.clone())
            .expect("no sms delivered")
    }
}

/// One-shot a JSON POST against the router.
pub async fn post_json(
    router: Router,
    path: &str,
    headers: &[(&str, &str)],
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(Body::from(body.to_string()))
        .expect("request build");

    let response = router.oneshot(request).await.expect("router call");
    into_json(response).await
}

pub async fn get(router: Router, path: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .expect("request build");
    let response = router.oneshot(request).await.expect("router call");
    into_json(response).await
}

async fn into_json(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .expect("body read")
        .to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}
