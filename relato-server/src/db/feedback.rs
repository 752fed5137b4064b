//! Feedback delivered to reporters

use relato_common::db::models::{Feedback, FeedbackKind};
use relato_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn feedback_from_row(row: &SqliteRow) -> Result<Feedback> {
    let kind: String = row.try_get("type")?;
    Ok(Feedback {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        message: row.try_get("message")?,
        kind: kind.parse()?,
        date: row.try_get("date")?,
    })
}

/// Insert one feedback row per user, returning how many were written
pub async fn create_for_users(
    pool: &SqlitePool,
    user_ids: &[i64],
    message: &str,
    kind: FeedbackKind,
) -> Result<u64> {
    let mut written = 0;
    for user_id in user_ids {
        let result = sqlx::query("INSERT INTO feedback (user_id, message, type) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(message)
            .bind(kind.as_str())
            .execute(pool)
            .await?;
        written += result.rows_affected();
    }

    Ok(written)
}

/// Feedback for one user, newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Feedback>> {
    let rows = sqlx::query("SELECT * FROM feedback WHERE user_id = ? ORDER BY date DESC, id DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(feedback_from_row).collect()
}
