//! Bearer-token issuing, verification, and the request guard middleware.

use anyhow::Context;
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::types::{LoginForm, RegisterRequest, TokenResponse};
use super::{ApiError, ApiResponse, AppState, validation};
use crate::config::AuthConfig;
use crate::constants::auth as auth_constants;
use crate::db::User;

/// Signed token payload. `exp` is mandatory and enforced on decode.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

/// The authenticated user resolved by the middleware, available to handlers
/// through request extensions.
#[derive(Debug, Clone)]
pub struct Principal(pub User);

impl Principal {
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] when the principal is not an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.is_admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin privileges required"))
        }
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] when the principal is neither the
    /// resource owner nor an admin.
    pub fn require_self_or_admin(&self, owner_id: &str) -> Result<(), ApiError> {
        if self.0.is_admin || self.0.id == owner_id {
            Ok(())
        } else {
            Err(ApiError::forbidden("Not allowed to access this resource"))
        }
    }
}

pub fn issue_token(config: &AuthConfig, user: &User) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        is_admin: user.is_admin,
        exp: (now + Duration::minutes(config.token_lifetime_minutes)).timestamp(),
        iat: now.timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .context("Failed to sign access token")
}

pub fn verify_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .context("Token rejected")?;

    Ok(data.claims)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(auth_constants::BEARER_PREFIX))
        .map(str::trim)
}

/// Verifies the bearer token, loads the subject's user row, and stores the
/// principal in request extensions. A subject that no longer exists is
/// indistinguishable from a bad token.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let claims = verify_token(&state.config.auth.jwt_secret, token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    let user = state
        .store
        .get_user_by_id(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    tracing::Span::current().record("user_id", user.id.as_str());
    request.extensions_mut().insert(Principal(user));

    Ok(next.run(request).await)
}

/// POST /api/auth/register
///
/// Creates an account and immediately issues a token for it.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>), ApiError> {
    let username = validation::validate_username(&payload.username)?;
    let email = validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;

    let user = state
        .users
        .register(username, email, &payload.password)
        .await?;

    tracing::info!(user_id = %user.id, "Account registered");

    let access_token = issue_token(&state.config.auth, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TokenResponse {
            access_token,
            token_type: auth_constants::TOKEN_TYPE.to_string(),
        })),
    ))
}

/// POST /api/auth/login
///
/// Password-grant style form where `username` carries the email. The error
/// response does not reveal whether the email or the password was wrong.
pub async fn login(
    State(state): State<Arc<AppState>>,
    axum::extract::Form(form): axum::extract::Form<LoginForm>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let user = state
        .users
        .authenticate(&form.username, &form.password)
        .await?;

    tracing::info!(user_id = %user.id, "Login succeeded");

    let access_token = issue_token(&state.config.auth, &user)?;

    Ok(Json(ApiResponse::success(TokenResponse {
        access_token,
        token_type: auth_constants::TOKEN_TYPE.to_string(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_lifetime_minutes: 120,
        }
    }

    fn test_user(id: &str, is_admin: bool) -> User {
        User {
            id: id.to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            is_admin,
            last_login_at: None,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            updated_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let config = test_config();
        let user = test_user("user-1", true);

        let token = issue_token(&config, &user).unwrap();
        let claims = verify_token(&config.jwt_secret, &token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert!(claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();
        let now = Utc::now();
        let claims = Claims {
            sub: "user-1".to_string(),
            is_admin: false,
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(4)).timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(&config.jwt_secret, &token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = test_config();
        let token = issue_token(&config, &test_user("user-1", false)).unwrap();

        assert!(verify_token("different-secret", &token).is_err());
    }

    #[test]
    fn admin_guard() {
        assert!(Principal(test_user("u1", true)).require_admin().is_ok());
        assert!(Principal(test_user("u1", false)).require_admin().is_err());
    }

    #[test]
    fn self_or_admin_guard() {
        let owner = Principal(test_user("u1", false));
        assert!(owner.require_self_or_admin("u1").is_ok());
        assert!(owner.require_self_or_admin("u2").is_err());

        let admin = Principal(test_user("u3", true));
        assert!(admin.require_self_or_admin("u2").is_ok());
    }
}
