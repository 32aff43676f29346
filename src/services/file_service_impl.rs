//! `SeaORM` + Cloud Storage implementation of the `FileService` trait.

use crate::clients::GcsClient;
use crate::db::Store;
use crate::entities::files;
use crate::services::file_service::{FileError, FileService, StoredFile};
use async_trait::async_trait;

pub struct GcsFileService {
    store: Store,
    gcs: GcsClient,
}

impl GcsFileService {
    #[must_use]
    pub const fn new(store: Store, gcs: GcsClient) -> Self {
        Self { store, gcs }
    }

    /// Storage object name for a file row.
    fn object_name(model: &files::Model) -> String {
        format!("{}-{}", model.user_id, model.name)
    }

    fn to_stored(&self, model: files::Model) -> Result<StoredFile, FileError> {
        let url = self
            .gcs
            .signed_url(&Self::object_name(&model))
            .map_err(|e| FileError::Storage(e.to_string()))?;

        Ok(StoredFile {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            extension: model.extension,
            content_type: model.content_type,
            size: model.size,
            url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Extension is the segment after the last dot, empty when there is none.
fn extension_of(filename: &str) -> &str {
    filename.rsplit_once('.').map_or("", |(_, ext)| ext)
}

#[async_trait]
impl FileService for GcsFileService {
    async fn upload(
        &self,
        owner_id: &str,
        filename: &str,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, FileError> {
        if filename.is_empty() {
            return Err(FileError::Validation("Filename is required".to_string()));
        }

        let content_type = content_type
            .filter(|ct| !ct.is_empty())
            .or_else(|| {
                mime_guess::from_path(filename)
                    .first_raw()
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let size = i64::try_from(bytes.len())
            .map_err(|_| FileError::Validation("File too large".to_string()))?;
        let object = format!("{owner_id}-{filename}");

        self.gcs
            .put_object(&object, &content_type, bytes)
            .await
            .map_err(|e| FileError::Storage(e.to_string()))?;

        let model = self
            .store
            .create_file(
                owner_id,
                filename,
                extension_of(filename),
                &content_type,
                size,
            )
            .await?;

        self.to_stored(model)
    }

    async fn get_by_id(&self, file_id: &str) -> Result<StoredFile, FileError> {
        let model = self
            .store
            .get_file(file_id)
            .await?
            .ok_or(FileError::NotFound)?;

        self.to_stored(model)
    }

    async fn list_all(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<StoredFile>, u64), FileError> {
        let models = self.store.list_files(limit, offset).await?;
        let total = self.store.count_files().await?;

        let files = models
            .into_iter()
            .map(|m| self.to_stored(m))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((files, total))
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<StoredFile>, u64), FileError> {
        let models = self
            .store
            .list_files_by_owner(owner_id, limit, offset)
            .await?;
        let total = self.store.count_files_by_owner(owner_id).await?;

        let files = models
            .into_iter()
            .map(|m| self.to_stored(m))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((files, total))
    }

    async fn delete(&self, file_id: &str) -> Result<(), FileError> {
        let model = self
            .store
            .get_file(file_id)
            .await?
            .ok_or(FileError::NotFound)?;

        // Object first; the row stays if the storage delete fails so no
        // dangling metadata points at a live object.
        self.gcs
            .delete_object(&Self::object_name(&model))
            .await
            .map_err(|e| FileError::Storage(e.to_string()))?;

        let deleted = self.store.delete_file(file_id).await?;
        if !deleted {
            return Err(FileError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_last_dot_segment() {
        assert_eq!(extension_of("report.pdf"), "pdf");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("no-extension"), "");
        assert_eq!(extension_of(".hidden"), "hidden");
    }
}
