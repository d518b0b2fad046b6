pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use service_core::axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AuthConfig;
use crate::services::{EmbedService, MagicLinkService, OtpService, SessionService};
use crate::store::HealthCheck;

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub store_health: Arc<dyn HealthCheck>,
    pub magic_links: MagicLinkService,
    pub otp: OtpService,
    pub sessions: SessionService,
    pub embed: EmbedService,
}

/// Build the full router. Every route is mounted both bare and under `/v1`
/// so clients pinned to either prefix keep working.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/auth/request-magic-link",
            post(handlers::auth::request_magic_link),
        )
        .route("/auth/send-to-mobile", post(handlers::auth::send_to_mobile))
        .route(
            "/auth/verify-magic-link",
            post(handlers::auth::verify_magic_link),
        )
        .route("/auth/refresh-token", post(handlers::auth::refresh_token))
        .route(
            "/phone/validate",
            post(handlers::phone::validate_phone_number),
        )
        .route("/phone/verify", post(handlers::phone::verify_phone_number))
        .route(
            "/generate-embed-url",
            post(handlers::embed::generate_embed_url),
        );

    Router::new()
        .merge(api.clone())
        .nest("/v1", api)
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
