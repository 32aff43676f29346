//! Account handlers: profile reads, listing, password change, deletion.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::Principal;
use super::types::{ChangePasswordRequest, Page, UserDto};
use super::validation::{self, PaginationQuery};
use super::{ApiError, ApiResponse, AppState};
use crate::services::StoredFile;

/// GET /api/users/me
pub async fn me(
    Extension(principal): Extension<Principal>,
) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(UserDto::from(principal.0)))
}

/// GET /api/users (admin)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Page<UserDto>>>, ApiError> {
    principal.require_admin()?;

    let (limit, offset) = query.resolve();
    let (users, total) = state.users.list(limit, offset).await?;

    Ok(Json(ApiResponse::success(Page {
        data: users.into_iter().map(UserDto::from).collect(),
        total,
        limit,
        offset,
    })))
}

/// GET /api/users/{id} (self or admin)
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    principal.require_self_or_admin(&user_id)?;

    let user = state.users.get_by_id(&user_id).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// GET /api/users/{id}/files (self or admin)
pub async fn list_user_files(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Page<StoredFile>>>, ApiError> {
    principal.require_self_or_admin(&user_id)?;

    let (limit, offset) = query.resolve();
    let (files, total) = state.files.list_by_owner(&user_id, limit, offset).await?;

    Ok(Json(ApiResponse::success(Page {
        data: files,
        total,
        limit,
        offset,
    })))
}

/// PUT /api/users/{id}/change-password (self or admin)
///
/// The old password is verified even for admins.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    principal.require_self_or_admin(&user_id)?;
    validation::validate_password(&payload.new_password)?;

    let user = state
        .users
        .change_password(&user_id, &payload.old_password, &payload.new_password)
        .await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// DELETE /api/users/{id} (self or admin)
///
/// Owned file and insight rows cascade; their stored blobs are not removed.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    principal.require_self_or_admin(&user_id)?;

    state.users.delete(&user_id).await?;

    tracing::info!(%user_id, "Account deleted");

    Ok(StatusCode::NO_CONTENT)
}
