//! `SeaORM` + Gemini implementation of the `InsightService` trait.

use crate::clients::{GcsClient, GeminiClient};
use crate::db::Store;
use crate::entities::insights;
use crate::services::insight_service::{InsightError, InsightService};
use async_trait::async_trait;

pub struct GeminiInsightService {
    store: Store,
    gcs: GcsClient,
    gemini: GeminiClient,
}

impl GeminiInsightService {
    #[must_use]
    pub const fn new(store: Store, gcs: GcsClient, gemini: GeminiClient) -> Self {
        Self { store, gcs, gemini }
    }
}

#[async_trait]
impl InsightService for GeminiInsightService {
    async fn generate(
        &self,
        prompt: &str,
        file_id: &str,
    ) -> Result<insights::Model, InsightError> {
        let file = self
            .store
            .get_file(file_id)
            .await?
            .ok_or(InsightError::FileNotFound)?;

        let object = format!("{}-{}", file.user_id, file.name);
        let object_uri = self.gcs.object_uri(&object);

        let response = self
            .gemini
            .generate_from_object(prompt, &object_uri, &file.content_type)
            .await
            .map_err(|e| InsightError::Dependency(e.to_string()))?;

        // Keyed to the file's owner, not the requester.
        let insight = self
            .store
            .create_insight(&file.user_id, file_id, prompt, &response)
            .await?;

        Ok(insight)
    }

    async fn get_by_id(&self, insight_id: &str) -> Result<insights::Model, InsightError> {
        self.store
            .get_insight(insight_id)
            .await?
            .ok_or(InsightError::NotFound)
    }

    async fn list_for_file(&self, file_id: &str) -> Result<Vec<insights::Model>, InsightError> {
        if self.store.get_file(file_id).await?.is_none() {
            return Err(InsightError::FileNotFound);
        }

        let insights = self.store.list_insights_by_file(file_id).await?;
        Ok(insights)
    }

    async fn delete(&self, insight_id: &str) -> Result<(), InsightError> {
        let deleted = self.store.delete_insight(insight_id).await?;
        if !deleted {
            return Err(InsightError::NotFound);
        }
        Ok(())
    }
}
