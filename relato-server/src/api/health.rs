//! Health check and welcome endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub git_hash: String,
    pub uptime_seconds: i64,
}

/// GET /health
///
/// No authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0);

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "relato-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        uptime_seconds: uptime,
    })
}

/// GET /
pub async fn welcome() -> Json<Value> {
    Json(json!({
        "message": format!("Welcome to Relato API v{}", env!("CARGO_PKG_VERSION")),
    }))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
}
