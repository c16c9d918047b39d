//! HTTP surface of the review service.
//!
//! [`start`] wires the whole application: runtime config from env, the
//! shared LLM gateway (with credential redaction), the SQLite-backed
//! review store, the review service, and the axum router with a
//! per-origin rate limit on the API routes.

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tracing::info;

use llm_gateway::{LlmGateway, ProviderClient, Redactor, config::default_config};
use pr_reviewer::{ProviderConfig, ReviewService, ReviewStore};

use crate::core::app_state::{AppState, StatusRegistry};
use crate::core::config::AppConfig;
use crate::error_handler::ApiError;
use crate::middleware_layer::rate_limit::{RateLimiter, rate_limit};
use crate::routes::{
    health_route::health_route,
    reviews::{
        create_review_route::create_review_route, get_review_route::get_review_route,
        history_route::history_route, status_route::review_status_route,
    },
};

/// Builds the application state from config and boots the HTTP server.
pub async fn start() -> Result<(), ApiError> {
    let config = AppConfig::from_env()?;

    // LLM gateway: provider client + bindings + secret redaction.
    let llm_config = default_config::model_config_from_env()?;
    let bindings = default_config::bindings_from_env(&llm_config)?;
    let client = ProviderClient::from_config(&llm_config)?;

    let mut redactor = Redactor::new();
    redactor.register_opt(llm_config.api_key.as_deref());
    redactor.register_opt(config.github_token.as_deref());
    let gateway = Arc::new(LlmGateway::new(client, bindings).with_redactor(redactor));

    let store = ReviewStore::connect(&config.database_url).await?;
    let service = Arc::new(ReviewService::new(
        gateway,
        store,
        ProviderConfig {
            base_api: config.github_base_api.clone(),
            token: config.github_token.clone(),
        },
        config.limits.clone(),
    ));

    let state = Arc::new(AppState {
        service,
        statuses: StatusRegistry::default(),
        rate_limiter: Arc::new(RateLimiter::new(config.rate_limit_per_minute)),
    });

    let api_routes = Router::new()
        .route("/api/reviews", post(create_review_route))
        .route("/api/reviews/history", get(history_route))
        .route("/api/reviews/{review_id}", get(get_review_route))
        .route("/api/reviews/{review_id}/status", get(review_status_route))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            rate_limit,
        ));

    let app = Router::new()
        .merge(api_routes)
        .route("/health", get(health_route))
        .with_state(state);

    let listener =
        tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(host = %config.host, port = config.port, "api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
