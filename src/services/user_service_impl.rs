//! `SeaORM` implementation of the `UserService` trait.

use crate::config::SecurityConfig;
use crate::db::repositories::user::verify_password;
use crate::db::{Store, User};
use crate::services::user_service::{UserError, UserService};
use async_trait::async_trait;

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

fn validate_new_password(password: &str) -> Result<(), UserError> {
    if password.len() < 8 {
        return Err(UserError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserError> {
        validate_new_password(password)?;

        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(UserError::Conflict);
        }

        let user = self
            .store
            .create_user(username, email, password, &self.security)
            .await?;

        Ok(user)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError> {
        let Some((user, password_hash)) =
            self.store.get_user_by_email_with_password(email).await?
        else {
            return Err(UserError::InvalidCredentials);
        };

        if !verify_password(password, &password_hash).await? {
            return Err(UserError::InvalidCredentials);
        }

        self.store.touch_user_last_login(&user.id).await?;

        // Re-read so the returned profile carries the fresh login timestamp.
        let user = self
            .store
            .get_user_by_id(&user.id)
            .await?
            .ok_or(UserError::NotFound)?;

        Ok(user)
    }

    async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<User, UserError> {
        validate_new_password(new_password)?;

        let Some((user, password_hash)) =
            self.store.get_user_by_id_with_password(user_id).await?
        else {
            return Err(UserError::NotFound);
        };

        if !verify_password(old_password, &password_hash).await? {
            return Err(UserError::InvalidCredentials);
        }

        self.store
            .update_user_password(&user.id, new_password, &self.security)
            .await?;

        let user = self
            .store
            .get_user_by_id(&user.id)
            .await?
            .ok_or(UserError::NotFound)?;

        Ok(user)
    }

    async fn get_by_id(&self, user_id: &str) -> Result<User, UserError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn list(&self, limit: u64, offset: u64) -> Result<(Vec<User>, u64), UserError> {
        let users = self.store.list_users(limit, offset).await?;
        let total = self.store.count_users().await?;
        Ok((users, total))
    }

    async fn delete(&self, user_id: &str) -> Result<(), UserError> {
        let deleted = self.store.delete_user(user_id).await?;
        if !deleted {
            return Err(UserError::NotFound);
        }
        Ok(())
    }
}
