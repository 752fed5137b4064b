//! Registration and login

use axum::{extract::State, http::StatusCode, Json};
use relato_common::auth::{issue_token, verify_password, TokenClaims};
use relato_common::db::models::Role;
use relato_common::time::unix_now;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::users::{self, NewUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Credenciais inválidas";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile returned on login, with the bearer token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub unit: Option<String>,
    pub sector: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub token: String,
}

/// POST /api/auth/register
///
/// Self-registration always creates a `STAFF` account; admins are created
/// through the staff management endpoints.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let email = req.email.trim();
    if req.name.trim().is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "name, email and password are required".to_string(),
        ));
    }

    if users::find_by_email(&state.db, email).await?.is_some() {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let user_id = users::create_user(
        &state.db,
        &NewUser::basic(req.name.trim(), email, &req.password, Role::Staff),
    )
    .await
    .map_err(|e| match e {
        relato_common::Error::Conflict(_) => ApiError::BadRequest("User already exists".to_string()),
        other => ApiError::from(other),
    })?;

    info!(user_id, "Registered new user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    info!("Login attempt for: {}", req.email);

    let user = users::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let claims = TokenClaims::new(user.id, user.role, unix_now(), state.token_ttl_seconds);
    let token = issue_token(&claims, &state.token_secret);

    Ok(Json(LoginResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        avatar: user.avatar,
        unit: user.unit,
        sector: user.sector,
        phone: user.phone,
        location: user.location,
        token,
    }))
}
