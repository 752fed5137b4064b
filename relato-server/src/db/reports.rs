//! Report storage

use chrono::NaiveDateTime;
use relato_common::db::models::{Priority, Report, Role};
use relato_common::time::to_db_timestamp;
use relato_common::Result;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Report status values used by the profile statistics
pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_APPROVED: &str = "Approved";

/// Fields for a newly submitted report
#[derive(Debug, Clone)]
pub struct NewReport {
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub priority: Priority,
    pub status: Option<String>,
    pub media: Value,
    pub metadata: Value,
    pub user_id: i64,
}

/// Submitting user as shown in the report list
#[derive(Debug, Clone, Serialize)]
pub struct ReportAuthor {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Report joined with its author
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportWithAuthor {
    #[serde(flatten)]
    pub report: Report,
    pub user: Option<ReportAuthor>,
}

fn parse_json_column(raw: &str, fallback: Value) -> Value {
    serde_json::from_str(raw).unwrap_or(fallback)
}

fn report_from_row(row: &SqliteRow) -> Result<Report> {
    let priority: String = row.try_get("priority")?;
    let media: String = row.try_get("media")?;
    let metadata: String = row.try_get("metadata")?;

    Ok(Report {
        id: row.try_get("id")?,
        category: row.try_get("category")?,
        subcategory: row.try_get("subcategory")?,
        description: row.try_get("description")?,
        priority: Priority::parse(&priority),
        status: row.try_get("status")?,
        media: parse_json_column(&media, Value::Array(Vec::new())),
        metadata: parse_json_column(&metadata, Value::Object(Default::default())),
        user_id: row.try_get("user_id")?,
        topic_id: row.try_get("topic_id")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a report, returning its id
pub async fn create_report(pool: &SqlitePool, report: &NewReport) -> Result<i64> {
    let media = serde_json::to_string(&report.media)?;
    let metadata = serde_json::to_string(&report.metadata)?;

    let result = sqlx::query(
        r#"
        INSERT INTO reports (
            category, subcategory, description, priority, status, media, metadata, user_id
        ) VALUES (?, ?, ?, ?, COALESCE(?, 'Pending'), ?, ?, ?)
        "#,
    )
    .bind(&report.category)
    .bind(&report.subcategory)
    .bind(&report.description)
    .bind(report.priority.as_str())
    .bind(&report.status)
    .bind(media)
    .bind(metadata)
    .bind(report.user_id)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_report(pool: &SqlitePool, id: i64) -> Result<Option<Report>> {
    let row = sqlx::query("SELECT * FROM reports WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(report_from_row).transpose()
}

/// All reports with their authors, newest first
pub async fn list_reports_with_authors(pool: &SqlitePool) -> Result<Vec<ReportWithAuthor>> {
    let rows = sqlx::query(
        r#"
        SELECT r.*, u.name AS author_name, u.email AS author_email, u.role AS author_role
        FROM reports r
        LEFT JOIN users u ON u.id = r.user_id
        ORDER BY r.created_at DESC, r.id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let report = report_from_row(row)?;
            let name: Option<String> = row.try_get("author_name")?;
            let user = match name {
                Some(name) => {
                    let role: String = row.try_get("author_role")?;
                    Some(ReportAuthor {
                        name,
                        email: row.try_get("author_email")?,
                        role: role.parse()?,
                    })
                }
                None => None,
            };
            Ok(ReportWithAuthor { report, user })
        })
        .collect()
}

/// Reports submitted by one user, newest first
pub async fn list_reports_by_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Report>> {
    let rows = sqlx::query(
        "SELECT * FROM reports WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(report_from_row).collect()
}

/// Link a report to a topic (overwrites any previous link)
pub async fn set_report_topic(pool: &SqlitePool, report_id: i64, topic_id: i64) -> Result<()> {
    sqlx::query("UPDATE reports SET topic_id = ? WHERE id = ?")
        .bind(topic_id)
        .bind(report_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn count_reports_for_topic(pool: &SqlitePool, topic_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE topic_id = ?")
        .bind(topic_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn count_all(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Reports created in `[start, end)`
pub async fn count_created_between(
    pool: &SqlitePool,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reports WHERE created_at >= ? AND created_at < ?",
    )
    .bind(to_db_timestamp(start))
    .bind(to_db_timestamp(end))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Reports by one user, optionally restricted to a status
pub async fn count_by_user(pool: &SqlitePool, user_id: i64, status: Option<&str>) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reports WHERE user_id = ? AND (? IS NULL OR status = ?)",
    )
    .bind(user_id)
    .bind(status)
    .bind(status)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Distinct authors of the reports linked to a topic
pub async fn reporters_for_topic(pool: &SqlitePool, topic_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar(
        "SELECT DISTINCT user_id FROM reports WHERE topic_id = ? ORDER BY user_id",
    )
    .bind(topic_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// `(topic_id, author rank)` for every linked report
pub async fn linked_report_ranks(pool: &SqlitePool) -> Result<Vec<(i64, Option<String>)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT r.topic_id, u.rank
        FROM reports r
        LEFT JOIN users u ON u.id = r.user_id
        WHERE r.topic_id IS NOT NULL
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
