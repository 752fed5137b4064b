//! Unit tests for database initialization
//!
//! Tests the implementation of:
//! - Automatic database creation on first run
//! - Idempotent schema creation
//! - Default settings initialization and NULL repair

use relato_common::db::init::{ensure_setting, init_database, DEFAULT_SETTINGS};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("relato.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("relato.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    drop(pool1);

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_all_tables_created() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("relato.db")).await.unwrap();

    for table in ["users", "reports", "topics", "feedback", "settings", "schema_version"] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists, "Table {} missing", table);
    }
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("relato.db")).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, DEFAULT_SETTINGS.len() as i64);

    let ai_triage: String =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'ai_triage'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(ai_triage, "true");
}

#[tokio::test]
async fn test_existing_setting_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("relato.db");
    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("UPDATE settings SET value = 'false' WHERE key = 'ai_triage'")
        .execute(&pool)
        .await
        .unwrap();
    drop(pool);

    let pool = init_database(&db_path).await.unwrap();
    let ai_triage: String =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'ai_triage'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(ai_triage, "false");
}

#[tokio::test]
async fn test_null_setting_reset_to_default() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("relato.db")).await.unwrap();

    sqlx::query("UPDATE settings SET value = NULL WHERE key = 'fleet_score'")
        .execute(&pool)
        .await
        .unwrap();

    ensure_setting(&pool, "fleet_score", "82.5").await.unwrap();

    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'fleet_score'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(value.as_deref(), Some("82.5"));
}
