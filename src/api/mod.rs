use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::{GcsClient, GeminiClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    FileService, GcsFileService, GeminiInsightService, InsightService, SeaOrmUserService,
    UserService,
};

pub mod auth;
mod error;
mod files;
mod insights;
mod observability;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub users: Arc<dyn UserService>,

    pub files: Arc<dyn FileService>,

    pub insights: Arc<dyn InsightService>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

/// Wires the concrete service implementations onto an already-opened store.
#[must_use]
pub fn create_app_state(
    config: Config,
    store: Store,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let gcs = GcsClient::new(config.storage.clone());
    let gemini = GeminiClient::new(config.ai.clone());

    let users: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
        store.clone(),
        config.security.clone(),
    ));
    let files: Arc<dyn FileService> =
        Arc::new(GcsFileService::new(store.clone(), gcs.clone()));
    let insights: Arc<dyn InsightService> =
        Arc::new(GeminiInsightService::new(store.clone(), gcs, gemini));

    Arc::new(AppState {
        config,
        store,
        users,
        files,
        insights,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_url,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    Ok(create_app_state(config, store, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(system::health))
        .route("/readiness", get(system::readiness))
        .with_state(state.clone());

    let metrics_router = Router::new()
        .route("/metrics", get(observability::get_metrics))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .merge(metrics_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/files", post(files::upload_file))
        .route("/files", get(files::list_files))
        .route("/files/{id}", get(files::get_file))
        .route("/files/{id}", delete(files::delete_file))
        .route("/files/{id}/insights", get(files::list_file_insights))
        .route("/insights", post(insights::generate_insight))
        .route("/insights/{id}", get(insights::get_insight))
        .route("/insights/{id}", delete(insights::delete_insight))
        .route("/users/me", get(users::me))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/files", get(users::list_user_files))
        .route("/users/{id}/change-password", put(users::change_password))
        .route("/users/{id}", delete(users::delete_user))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
