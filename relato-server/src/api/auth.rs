//! Bearer token authentication
//!
//! Uses the custom extractor pattern: handlers that need a caller take an
//! [`AuthUser`] (any valid token) or an [`AdminUser`] (valid token, `ADMIN` role)
//! argument. Public handlers simply omit it.
//!
//! - Missing `Authorization` header: 403
//! - Malformed, forged or expired token: 401
//! - Valid token without the admin role on an admin route: 403

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use relato_common::auth::{verify_token, TokenError};
use relato_common::db::models::Role;
use relato_common::time::unix_now;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Refuse unless the caller is `user_id`
    pub fn ensure_self(&self, user_id: i64) -> Result<(), ApiError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Unauthorized".to_string()))
        }
    }
}

/// Authenticated caller holding the `ADMIN` role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminUser(pub AuthUser);

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Forbidden("No token provided".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Malformed Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".to_string()))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts)?;

        let claims = verify_token(token, &state.token_secret, unix_now()).map_err(|e| {
            debug!("Token rejected: {}", e);
            match e {
                TokenError::Expired { .. } => ApiError::Unauthorized("Token expired".to_string()),
                _ => ApiError::Unauthorized("Invalid token".to_string()),
            }
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden("Require Admin Role".to_string()));
        }
        Ok(AdminUser(user))
    }
}
