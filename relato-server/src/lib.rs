//! relato-server library
//!
//! REST service for incident reports: staff submit reports, the triage engine
//! groups them into topics, and commanders act on topics.

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod seed;
pub mod triage;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Bearer token signing key
    pub token_secret: Arc<Vec<u8>>,
    /// Lifetime of issued tokens
    pub token_ttl_seconds: i64,
    /// Server start, for the health endpoint's uptime
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, token_secret: Vec<u8>, token_ttl_seconds: i64) -> Self {
        Self {
            db,
            token_secret: Arc::new(token_secret),
            token_ttl_seconds,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Authentication is enforced per handler by the `AuthUser`/`AdminUser`
/// extractors, so public and protected routes share one router.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, patch, post, put};

    let routes = Router::new()
        // Session
        .route("/api/auth/register", post(api::session::register))
        .route("/api/auth/login", post(api::session::login))
        // Reports
        .route(
            "/api/reports",
            post(api::reports::create_report).get(api::reports::list_reports),
        )
        .route("/api/reports/my-history", get(api::reports::my_history))
        // Users
        .route(
            "/api/users/:id",
            get(api::users::get_user).put(api::users::update_user),
        )
        .route("/api/users/:id/feedback", get(api::users::get_feedback))
        // Topics
        .route(
            "/api/topics",
            get(api::topics::list_topics).post(api::topics::create_topic),
        )
        .route("/api/topics/:id", patch(api::topics::patch_topic))
        .route("/api/topics/:id/action", post(api::topics::topic_action))
        .route("/api/topics/:id/suggestions", post(api::topics::add_suggestion))
        // Commander
        .route("/api/admin/stats", get(api::admin::get_stats))
        .route(
            "/api/admin/settings",
            get(api::settings::get_settings).put(api::settings::update_settings),
        )
        .route(
            "/api/admin/staff",
            get(api::admin::list_staff).post(api::admin::create_staff),
        )
        .route(
            "/api/admin/staff/:id",
            put(api::admin::update_staff).delete(api::admin::delete_staff),
        );

    Router::new()
        .merge(routes)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
