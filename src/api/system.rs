//! Liveness and readiness probes.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
}

/// GET /api/health
///
/// Process-level liveness; answers as long as the server loop runs.
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/readiness
///
/// Readiness gated on a database round trip. 503 when the store does not
/// answer, so load balancers drain the instance instead of erroring requests.
pub async fn readiness(State(state): State<Arc<AppState>>) -> Response {
    match state.store.ping().await {
        Ok(()) => Json(ApiResponse::success(ReadinessResponse { status: "ready" })).into_response(),
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::<()>::error("Database unavailable")),
            )
                .into_response()
        }
    }
}
