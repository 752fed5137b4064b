//! Shared helpers for relato-server integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
};
use relato_common::auth::{issue_token, TokenClaims};
use relato_common::db::models::{Priority, Role};
use relato_common::time::unix_now;
use relato_server::db::reports::{self, NewReport};
use relato_server::db::users::{self, NewUser};
use relato_server::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

/// Fresh in-memory database with the production schema
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    relato_common::db::init_schema(&pool)
        .await
        .expect("Should create schema");
    pool
}

pub fn setup_app(db: SqlitePool) -> axum::Router {
    build_router(AppState::new(db, TEST_SECRET.to_vec(), 3600))
}

pub async fn create_user(db: &SqlitePool, name: &str, email: &str, role: Role) -> i64 {
    users::create_user(db, &NewUser::basic(name, email, "secret", role))
        .await
        .expect("Should create user")
}

pub async fn create_ranked_user(db: &SqlitePool, name: &str, email: &str, rank: &str) -> i64 {
    let mut user = NewUser::basic(name, email, "secret", Role::Staff);
    user.rank = Some(rank.to_string());
    users::create_user(db, &user).await.expect("Should create user")
}

pub fn token_for(user_id: i64, role: Role) -> String {
    issue_token(&TokenClaims::new(user_id, role, unix_now(), 3600), TEST_SECRET)
}

/// Store a report without triaging it
pub async fn store_report(
    db: &SqlitePool,
    user_id: i64,
    category: &str,
    subcategory: &str,
    description: &str,
    priority: &str,
) -> i64 {
    reports::create_report(
        db,
        &NewReport {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            description: description.to_string(),
            priority: Priority::parse(priority),
            status: None,
            media: json!([]),
            metadata: json!({}),
            user_id,
        },
    )
    .await
    .expect("Should store report")
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
