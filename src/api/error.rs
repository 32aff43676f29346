use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{FileError, InsightError, UserError};

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),

    Forbidden(String),

    Conflict(String),

    InvalidCredentials(String),

    NotFound(String),

    ValidationError(String),

    DatabaseError(String),

    StorageError(String),

    DependencyError { service: String, message: String },

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::InvalidCredentials(msg) => write!(f, "Invalid credentials: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::StorageError(msg) => write!(f, "Storage error: {msg}"),
            Self::DependencyError { service, message } => {
                write!(f, "{service} error: {message}")
            }
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::InvalidCredentials(msg) | Self::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::StorageError(msg) => {
                tracing::warn!("Storage error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Object storage is unavailable".to_string(),
                )
            }
            Self::DependencyError { service, message } => {
                tracing::warn!("{service} API error: {message}");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("{service} service is unavailable"),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Conflict => Self::Conflict(err.to_string()),
            UserError::InvalidCredentials => Self::InvalidCredentials(err.to_string()),
            UserError::NotFound => Self::NotFound(err.to_string()),
            UserError::Validation(msg) => Self::ValidationError(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound => Self::NotFound(err.to_string()),
            FileError::Storage(msg) => Self::StorageError(msg),
            FileError::Validation(msg) => Self::ValidationError(msg),
            FileError::Database(msg) => Self::DatabaseError(msg),
            FileError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<InsightError> for ApiError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::NotFound | InsightError::FileNotFound => Self::NotFound(err.to_string()),
            InsightError::Dependency(message) => Self::DependencyError {
                service: "Gemini".to_string(),
                message,
            },
            InsightError::Database(msg) => Self::DatabaseError(msg),
            InsightError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}
