use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::insights;

pub struct InsightRepository {
    conn: DatabaseConnection,
}

impl InsightRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: &str,
        file_id: &str,
        prompt: &str,
        response: &str,
    ) -> Result<insights::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = insights::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            file_id: Set(file_id.to_string()),
            prompt: Set(prompt.to_string()),
            response: Set(response.to_string()),
            created_at: Set(now),
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert insight")
    }

    pub async fn get(&self, id: &str) -> Result<Option<insights::Model>> {
        insights::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query insight by ID")
    }

    pub async fn list_by_file(&self, file_id: &str) -> Result<Vec<insights::Model>> {
        insights::Entity::find()
            .filter(insights::Column::FileId.eq(file_id))
            .order_by_desc(insights::Column::CreatedAt)
            .order_by_asc(insights::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list insights by file")
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = insights::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete insight")?;

        Ok(result.rows_affected > 0)
    }
}
