use serde::Deserialize;

use super::ApiError;
use crate::constants::pagination;

/// Query-string pagination, clamped to sane bounds before hitting the store.
#[derive(Debug, Deserialize, Default)]
pub struct PaginationQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PaginationQuery {
    /// Resolved `(limit, offset)` with defaults applied and the limit capped.
    #[must_use]
    pub fn resolve(&self) -> (u64, u64) {
        let limit = self
            .limit
            .unwrap_or(pagination::DEFAULT_LIMIT)
            .clamp(1, pagination::MAX_LIMIT);
        let offset = self.offset.unwrap_or(0);
        (limit, offset)
    }
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    // Shape check only, deliverability is not our problem.
    let mut parts = trimmed.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation("Invalid email address"));
    }

    Ok(trimmed)
}

pub fn validate_username(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if trimmed.len() > 64 {
        return Err(ApiError::validation(
            "Username must be 64 characters or less",
        ));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(password)
}

pub fn validate_prompt(prompt: &str) -> Result<&str, ApiError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Prompt cannot be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_apply() {
        let (limit, offset) = PaginationQuery::default().resolve();
        assert_eq!(limit, 20);
        assert_eq!(offset, 0);
    }

    #[test]
    fn pagination_limit_is_clamped() {
        let query = PaginationQuery {
            limit: Some(10_000),
            offset: Some(40),
        };
        assert_eq!(query.resolve(), (100, 40));

        let zero = PaginationQuery {
            limit: Some(0),
            offset: None,
        };
        assert_eq!(zero.resolve(), (1, 0));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert_eq!(validate_email("  user@example.com  ").unwrap(), "user@example.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("a".repeat(65).as_str()).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_prompt() {
        assert!(validate_prompt("Summarize this file").is_ok());
        assert!(validate_prompt("   ").is_err());
    }
}
