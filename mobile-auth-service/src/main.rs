use std::net::SocketAddr;
use std::sync::Arc;

use mobile_auth_service::{
    build_router,
    config::AuthConfig,
    services::{
        EmbedService, EnvSecretSource, IdentityGuard, MagicLinkService, OtpService, SecretCache,
        SessionService, SmsGateway, SmtpMailer, TokenService,
    },
    store::MongoStore,
    AppState,
};
use service_core::observability::logging::init_tracing;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting mobile auth service"
    );

    let store = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database)
        .await
        .map_err(|e| service_core::error::AppError::StoreError(anyhow::anyhow!(e)))?;
    store
        .initialize_indexes()
        .await
        .map_err(|e| service_core::error::AppError::StoreError(anyhow::anyhow!(e)))?;
    tracing::info!("Store initialized");

    let store = Arc::new(store);

    let secrets = Arc::new(SecretCache::new(
        Arc::new(EnvSecretSource),
        config.secrets.session_secret_name.clone(),
        config.secrets.embed_secret_name.clone(),
    ));
    let tokens = TokenService::new(secrets);

    let email = Arc::new(SmtpMailer::new(&config.smtp)?);
    let sms = Arc::new(SmsGateway::new(&config.sms));
    tracing::info!("Delivery providers initialized");

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
        email,
        sms.clone(),
        sessions.clone(),
        config.auth.clone(),
        config.security.clone(),
    );
    let otp = OtpService::new(
        store.clone(),
        store.clone(),
        guard.clone(),
        sms,
        config.auth.clone(),
        config.security.clone(),
    );
    let embed = EmbedService::new(
        guard,
        tokens,
        store.clone(),
        config.embed.clone(),
        config.auth.clone(),
    );

    let state = AppState {
        config: config.clone(),
        store_health: store,
        magic_links,
        otp,
        sessions,
        embed,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
