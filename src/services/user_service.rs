//! Domain service for registration, authentication, and account management.

use thiserror::Error;

use crate::db::User;

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Email already registered")]
    Conflict,

    /// Deliberately identical for unknown email and wrong password so the
    /// response does not reveal which part failed.
    #[error("Wrong email or password")]
    InvalidCredentials,

    #[error("User not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for user accounts.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Registers a new account with admin=false.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] if the email is already registered.
    async fn register(&self, username: &str, email: &str, password: &str)
    -> Result<User, UserError>;

    /// Verifies credentials and updates the last-login timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] on any mismatch.
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError>;

    /// Changes a user's password after verifying the old one.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] if the old password does not
    /// verify.
    async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<User, UserError>;

    /// Gets a user by id.
    async fn get_by_id(&self, user_id: &str) -> Result<User, UserError>;

    /// Paginated user listing plus the total count.
    async fn list(&self, limit: u64, offset: u64) -> Result<(Vec<User>, u64), UserError>;

    /// Deletes an account. Owned files and insights cascade.
    async fn delete(&self, user_id: &str) -> Result<(), UserError>;
}
