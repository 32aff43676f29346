use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::files;

pub struct FileRepository {
    conn: DatabaseConnection,
}

impl FileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: &str,
        name: &str,
        extension: &str,
        content_type: &str,
        size: i64,
    ) -> Result<files::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = files::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            name: Set(name.to_string()),
            extension: Set(extension.to_string()),
            content_type: Set(content_type.to_string()),
            size: Set(size),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert file metadata")
    }

    pub async fn get(&self, id: &str) -> Result<Option<files::Model>> {
        files::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query file by ID")
    }

    /// Newest first; id as a tiebreaker so pages are stable.
    pub async fn list_all(&self, limit: u64, offset: u64) -> Result<Vec<files::Model>> {
        files::Entity::find()
            .order_by_desc(files::Column::CreatedAt)
            .order_by_asc(files::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list files")
    }

    pub async fn list_by_owner(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<files::Model>> {
        files::Entity::find()
            .filter(files::Column::UserId.eq(user_id))
            .order_by_desc(files::Column::CreatedAt)
            .order_by_asc(files::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list files by owner")
    }

    pub async fn count_all(&self) -> Result<u64> {
        files::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count files")
    }

    pub async fn count_by_owner(&self, user_id: &str) -> Result<u64> {
        files::Entity::find()
            .filter(files::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count files by owner")
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = files::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete file metadata")?;

        Ok(result.rows_affected > 0)
    }
}
