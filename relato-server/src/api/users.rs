//! User profile endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use relato_common::db::models::{Feedback, User};
use serde::{Deserialize, Serialize};

use crate::api::auth::AuthUser;
use crate::db::reports::{self, STATUS_APPROVED, STATUS_PENDING};
use crate::db::users::{self, UserUpdate};
use crate::db::feedback;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Report activity shown on a profile
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub actions_validated: i64,
    /// Percentage of the user's reports that were approved; 100 with no reports
    pub response_rate: i64,
    pub active_dispatches: i64,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub stats: ProfileStats,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub unit: Option<String>,
    pub sector: Option<String>,
}

fn response_rate(approved: i64, total: i64) -> i64 {
    if total > 0 {
        ((approved as f64 / total as f64) * 100.0).round() as i64
    } else {
        100
    }
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserProfile>> {
    let user = users::get_user(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let total = reports::count_by_user(&state.db, id, None).await?;
    let approved = reports::count_by_user(&state.db, id, Some(STATUS_APPROVED)).await?;
    let pending = reports::count_by_user(&state.db, id, Some(STATUS_PENDING)).await?;

    Ok(Json(UserProfile {
        user,
        stats: ProfileStats {
            actions_validated: approved,
            response_rate: response_rate(approved, total),
            active_dispatches: pending,
        },
    }))
}

/// PUT /api/users/:id
///
/// Callers may only edit their own profile. Role and status are not editable here.
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<ProfileUpdateRequest>,
) -> ApiResult<Json<User>> {
    caller.ensure_self(id)?;

    let email = req
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());

    let updated = users::update_user(
        &state.db,
        id,
        UserUpdate {
            name: req.name,
            email,
            password: req.password,
            avatar: req.avatar,
            phone: req.phone,
            location: req.location,
            unit: req.unit,
            sector: req.sector,
            ..Default::default()
        },
    )
    .await?;

    Ok(Json(updated))
}

/// GET /api/users/:id/feedback
pub async fn get_feedback(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Feedback>>> {
    caller.ensure_self(id)?;
    Ok(Json(feedback::list_for_user(&state.db, id).await?))
}
