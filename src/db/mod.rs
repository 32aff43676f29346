use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{files, insights};

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn file_repo(&self) -> repositories::file::FileRepository {
        repositories::file::FileRepository::new(self.conn.clone())
    }

    fn insight_repo(&self) -> repositories::insight::InsightRepository {
        repositories::insight::InsightRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(username, email, password, security)
            .await
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn get_user_by_id_with_password(&self, id: &str) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_id_with_password(id).await
    }

    pub async fn list_users(&self, limit: u64, offset: u64) -> Result<Vec<User>> {
        self.user_repo().list(limit, offset).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn touch_user_last_login(&self, id: &str) -> Result<()> {
        self.user_repo().touch_last_login(id).await
    }

    pub async fn update_user_password(
        &self,
        id: &str,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, security)
            .await
    }

    pub async fn delete_user(&self, id: &str) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    // ========== Files ==========

    pub async fn create_file(
        &self,
        user_id: &str,
        name: &str,
        extension: &str,
        content_type: &str,
        size: i64,
    ) -> Result<files::Model> {
        self.file_repo()
            .create(user_id, name, extension, content_type, size)
            .await
    }

    pub async fn get_file(&self, id: &str) -> Result<Option<files::Model>> {
        self.file_repo().get(id).await
    }

    pub async fn list_files(&self, limit: u64, offset: u64) -> Result<Vec<files::Model>> {
        self.file_repo().list_all(limit, offset).await
    }

    pub async fn list_files_by_owner(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<files::Model>> {
        self.file_repo().list_by_owner(user_id, limit, offset).await
    }

    pub async fn count_files(&self) -> Result<u64> {
        self.file_repo().count_all().await
    }

    pub async fn count_files_by_owner(&self, user_id: &str) -> Result<u64> {
        self.file_repo().count_by_owner(user_id).await
    }

    pub async fn delete_file(&self, id: &str) -> Result<bool> {
        self.file_repo().delete(id).await
    }

    // ========== Insights ==========

    pub async fn create_insight(
        &self,
        user_id: &str,
        file_id: &str,
        prompt: &str,
        response: &str,
    ) -> Result<insights::Model> {
        self.insight_repo()
            .create(user_id, file_id, prompt, response)
            .await
    }

    pub async fn get_insight(&self, id: &str) -> Result<Option<insights::Model>> {
        self.insight_repo().get(id).await
    }

    pub async fn list_insights_by_file(&self, file_id: &str) -> Result<Vec<insights::Model>> {
        self.insight_repo().list_by_file(file_id).await
    }

    pub async fn delete_insight(&self, id: &str) -> Result<bool> {
        self.insight_repo().delete(id).await
    }
}
