//! File handlers: multipart upload, retrieval with signed URLs, deletion.

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::Principal;
use super::types::{InsightDto, Page};
use super::validation::PaginationQuery;
use super::{ApiError, ApiResponse, AppState};
use crate::services::StoredFile;

/// POST /api/files
///
/// Accepts a single multipart part named `file`. The whole part is read into
/// memory; size is its byte length.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<StoredFile>>), ApiError> {
    let mut part = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;

            part = Some((filename, content_type, bytes.to_vec()));
            break;
        }
    }

    let (filename, content_type, bytes) =
        part.ok_or_else(|| ApiError::validation("Multipart field 'file' is required"))?;

    let stored = state
        .files
        .upload(&principal.0.id, &filename, content_type, bytes)
        .await?;

    tracing::info!(file_id = %stored.id, size = stored.size, "File uploaded");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(stored))))
}

/// GET /api/files (admin)
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Page<StoredFile>>>, ApiError> {
    principal.require_admin()?;

    let (limit, offset) = query.resolve();
    let (files, total) = state.files.list_all(limit, offset).await?;

    Ok(Json(ApiResponse::success(Page {
        data: files,
        total,
        limit,
        offset,
    })))
}

/// GET /api/files/{id} (owner or admin)
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<StoredFile>>, ApiError> {
    let file = state.files.get_by_id(&file_id).await?;
    principal.require_self_or_admin(&file.user_id)?;

    Ok(Json(ApiResponse::success(file)))
}

/// DELETE /api/files/{id} (owner or admin)
///
/// The stored object is removed before the row; a storage failure keeps the
/// row so the metadata still points at something recoverable.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let file = state.files.get_by_id(&file_id).await?;
    principal.require_self_or_admin(&file.user_id)?;

    state.files.delete(&file_id).await?;

    tracing::info!(%file_id, "File deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/files/{id}/insights (owner or admin)
///
/// 404 when the file is absent; an existing file with no insights yields an
/// empty list.
pub async fn list_file_insights(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<InsightDto>>>, ApiError> {
    let file = state.files.get_by_id(&file_id).await?;
    principal.require_self_or_admin(&file.user_id)?;

    let insights = state.insights.list_for_file(&file_id).await?;

    Ok(Json(ApiResponse::success(
        insights.into_iter().map(InsightDto::from).collect(),
    )))
}
