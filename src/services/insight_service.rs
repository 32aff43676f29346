//! Domain service for AI-generated insights over uploaded files.

use thiserror::Error;

use crate::entities::insights;

/// Errors specific to insight operations.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Insight not found")]
    NotFound,

    #[error("File not found")]
    FileNotFound,

    /// Generative-model failure. Single synchronous call, no retry.
    #[error("Generation failed: {0}")]
    Dependency(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for InsightError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for InsightError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for insights.
#[async_trait::async_trait]
pub trait InsightService: Send + Sync {
    /// Runs the prompt against the file's stored content and persists the
    /// result, keyed to the file's owner.
    ///
    /// # Errors
    ///
    /// Returns [`InsightError::FileNotFound`] if the file does not exist and
    /// [`InsightError::Dependency`] if the model call fails.
    async fn generate(&self, prompt: &str, file_id: &str)
    -> Result<insights::Model, InsightError>;

    /// Gets an insight by id.
    async fn get_by_id(&self, insight_id: &str) -> Result<insights::Model, InsightError>;

    /// All insights for a file. The file must exist; a file with no insights
    /// yields an empty list rather than an error.
    async fn list_for_file(&self, file_id: &str) -> Result<Vec<insights::Model>, InsightError>;

    /// Deletes an insight by id.
    async fn delete(&self, insight_id: &str) -> Result<(), InsightError>;
}
