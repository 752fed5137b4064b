//! System settings endpoints (admin)

use axum::{extract::State, Json};
use tracing::info;

use crate::api::auth::AdminUser;
use crate::db::settings::{self, SettingsUpdate, SystemSettings};
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/admin/settings
pub async fn get_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<SystemSettings>> {
    Ok(Json(settings::load_settings(&state.db).await?))
}

/// PUT /api/admin/settings
///
/// Only the fields present in the body are changed.
pub async fn update_settings(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<Json<SystemSettings>> {
    let updated = settings::update_settings(&state.db, update).await?;
    info!(by = admin.user_id, ai_triage = updated.ai_triage, "System settings updated");
    Ok(Json(updated))
}
