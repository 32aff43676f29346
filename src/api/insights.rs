//! Insight handlers: generation against stored files, retrieval, deletion.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::Principal;
use super::types::{GenerateInsightRequest, InsightDto};
use super::validation;
use super::{ApiError, ApiResponse, AppState};

/// POST /api/insights (file owner or admin)
///
/// Runs the prompt against the referenced file. The stored insight is keyed
/// to the file's owner even when an admin requested it.
pub async fn generate_insight(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<GenerateInsightRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InsightDto>>), ApiError> {
    let prompt = validation::validate_prompt(&payload.prompt)?;

    let file = state.files.get_by_id(&payload.file_id).await?;
    principal.require_self_or_admin(&file.user_id)?;

    let insight = state.insights.generate(prompt, &payload.file_id).await?;

    tracing::info!(insight_id = %insight.id, file_id = %insight.file_id, "Insight generated");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(InsightDto::from(insight))),
    ))
}

/// GET /api/insights/{id} (owner or admin)
pub async fn get_insight(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(insight_id): Path<String>,
) -> Result<Json<ApiResponse<InsightDto>>, ApiError> {
    let insight = state.insights.get_by_id(&insight_id).await?;
    principal.require_self_or_admin(&insight.user_id)?;

    Ok(Json(ApiResponse::success(InsightDto::from(insight))))
}

/// DELETE /api/insights/{id} (owner or admin)
pub async fn delete_insight(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(insight_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let insight = state.insights.get_by_id(&insight_id).await?;
    principal.require_self_or_admin(&insight.user_id)?;

    state.insights.delete(&insight_id).await?;

    tracing::info!(%insight_id, "Insight deleted");

    Ok(StatusCode::NO_CONTENT)
}
