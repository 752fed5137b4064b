//! Commander dashboard and staff management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use relato_common::db::models::{Role, User};
use relato_common::time::{self, month_label, month_window};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::info;

use crate::api::auth::AdminUser;
use crate::db::users::{self, NewUser, UserUpdate};
use crate::db::{reports, settings, topics};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Months covered by the report trend, current month included
pub const TREND_MONTHS: u32 = 6;

#[derive(Debug, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub value: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub personnel_score: f64,
    pub fleet_score: f64,
    pub supply_score: f64,
    /// Total reports received
    pub tactical_inputs: i64,
    /// Share of topics approved or archived, percent with one decimal
    pub convergence: f64,
    pub consolidated_topics: i64,
    pub critical_alerts: i64,
    /// Oldest month first
    pub trends: Vec<MonthlyTrend>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStaffRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
    pub status: Option<String>,
}

fn convergence(resolved: i64, total: i64) -> f64 {
    if total > 0 {
        ((resolved as f64 / total as f64) * 1000.0).round() / 10.0
    } else {
        0.0
    }
}

async fn monthly_trends(pool: &SqlitePool, today: NaiveDate) -> ApiResult<Vec<MonthlyTrend>> {
    let mut trends = Vec::with_capacity(TREND_MONTHS as usize);
    for months_back in (0..TREND_MONTHS).rev() {
        let (start, end) = month_window(today, months_back);
        trends.push(MonthlyTrend {
            month: month_label(start),
            value: reports::count_created_between(pool, start, end).await?,
        });
    }
    Ok(trends)
}

/// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<DashboardStats>> {
    let system = settings::load_settings(&state.db).await?;
    let counts = topics::count_topics(&state.db).await?;
    let tactical_inputs = reports::count_all(&state.db).await?;
    let trends = monthly_trends(&state.db, time::now().date_naive()).await?;

    Ok(Json(DashboardStats {
        personnel_score: system.personnel_score,
        fleet_score: system.fleet_score,
        supply_score: system.supply_score,
        tactical_inputs,
        convergence: convergence(counts.resolved, counts.total),
        consolidated_topics: counts.consolidated,
        critical_alerts: counts.critical,
        trends,
    }))
}

/// GET /api/admin/staff
pub async fn list_staff(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(users::list_users(&state.db).await?))
}

/// POST /api/admin/staff
pub async fn create_staff(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateStaffRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let email = req.email.trim();
    if req.name.trim().is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "name, email and password are required".to_string(),
        ));
    }

    let mut new_user = NewUser::basic(
        req.name.trim(),
        email,
        &req.password,
        req.role.unwrap_or(Role::Staff),
    );
    new_user.status = req.status;
    new_user.rank = req.rank;

    let id = users::create_user(&state.db, &new_user).await?;
    info!(user_id = id, by = admin.user_id, role = %new_user.role, "Staff account created");

    let user = users::get_user(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("User {} vanished after insert", id)))?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/admin/staff/:id
pub async fn update_staff(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStaffRequest>,
) -> ApiResult<Json<User>> {
    let updated = users::update_user(
        &state.db,
        id,
        UserUpdate {
            name: req.name,
            email: req.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
            role: req.role,
            password: req.password,
            status: req.status,
            ..Default::default()
        },
    )
    .await?;

    info!(user_id = id, by = admin.user_id, "Staff account updated");
    Ok(Json(updated))
}

/// DELETE /api/admin/staff/:id
///
/// 409 while the account still owns reports.
pub async fn delete_staff(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    users::delete_user(&state.db, id).await?;
    info!(user_id = id, by = admin.user_id, "Staff account deleted");
    Ok(Json(json!({ "message": "Staff deleted" })))
}
