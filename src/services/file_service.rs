//! Domain service for file upload, retrieval, listing, and deletion.
//!
//! Byte content lives in object storage; the database row is metadata only.
//! Read paths regenerate a short-lived signed URL on every call.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to file operations.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for FileError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for FileError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// File metadata plus a freshly signed retrieval URL.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub extension: String,
    pub content_type: String,
    pub size: i64,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Domain service trait for files.
#[async_trait::async_trait]
pub trait FileService: Send + Sync {
    /// Pushes content to object storage, then persists metadata. The two
    /// writes are not transactional; a crash in between leaves an orphaned
    /// object.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Storage`] if the object store rejects the write.
    async fn upload(
        &self,
        owner_id: &str,
        filename: &str,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, FileError>;

    /// Gets metadata plus a fresh signed URL.
    async fn get_by_id(&self, file_id: &str) -> Result<StoredFile, FileError>;

    /// All files, newest first, plus the total count.
    async fn list_all(&self, limit: u64, offset: u64)
    -> Result<(Vec<StoredFile>, u64), FileError>;

    /// One owner's files, newest first, plus that owner's total count.
    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<StoredFile>, u64), FileError>;

    /// Deletes the stored object first, then the metadata row. If the object
    /// delete fails the row is kept.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::NotFound`] if no such row exists and
    /// [`FileError::Storage`] if the object store rejects the delete.
    async fn delete(&self, file_id: &str) -> Result<(), FileError>;
}
