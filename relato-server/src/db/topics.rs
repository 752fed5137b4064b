//! Topic storage
//!
//! Suggestions live in a JSON text column and are parsed on read.
//! Triage writes go through [`find_open_topic_for`] and [`update_triage_fields`];
//! commander actions through [`apply_action`] and [`update_topic`].

use relato_common::db::models::{ImpactType, Priority, Suggestion, Topic, TopicStatus};
use relato_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Fields for a new topic
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub title: String,
    pub ai_summary: String,
    pub status: TopicStatus,
    pub priority: Priority,
    pub impact_type: ImpactType,
    pub suggestions: Vec<Suggestion>,
}

/// Partial topic edit; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct TopicPatch {
    pub title: Option<String>,
    pub ai_summary: Option<String>,
    pub status: Option<TopicStatus>,
    pub priority: Option<Priority>,
    pub impact_type: Option<ImpactType>,
    pub final_solution: Option<String>,
    pub feedback_message: Option<String>,
}

/// Topic counters for the commander dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopicCounts {
    pub total: i64,
    /// Topics in `validated`
    pub consolidated: i64,
    /// Topics with high priority or in `priority_alert`
    pub critical: i64,
    /// Topics in `approved` or `archived`
    pub resolved: i64,
}

fn topic_from_row(row: &SqliteRow) -> Result<Topic> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;
    let impact: String = row.try_get("impact_type")?;
    let suggestions: Option<String> = row.try_get("suggestions")?;

    Ok(Topic {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        ai_summary: row.try_get("ai_summary")?,
        status: status.parse()?,
        priority: Priority::parse(&priority),
        impact_type: impact.parse().unwrap_or(ImpactType::Moral),
        suggestions: parse_suggestions(suggestions.as_deref()),
        action: row.try_get("action")?,
        final_solution: row.try_get("final_solution")?,
        feedback_message: row.try_get("feedback_message")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Parse the stored suggestion list; anything that is not a JSON array reads as empty
fn parse_suggestions(raw: Option<&str>) -> Vec<Suggestion> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// Insert a topic, returning the stored row
pub async fn create_topic(pool: &SqlitePool, topic: &NewTopic) -> Result<Topic> {
    let suggestions = serde_json::to_string(&topic.suggestions)?;

    let result = sqlx::query(
        r#"
        INSERT INTO topics (title, ai_summary, status, priority, impact_type, suggestions)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&topic.title)
    .bind(&topic.ai_summary)
    .bind(topic.status.as_str())
    .bind(topic.priority.as_str())
    .bind(topic.impact_type.as_str())
    .bind(suggestions)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    get_topic(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Topic {} vanished after insert", id)))
}

pub async fn get_topic(pool: &SqlitePool, id: i64) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT * FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(topic_from_row).transpose()
}

/// All topics, optionally filtered by status, oldest first
pub async fn list_topics(pool: &SqlitePool, status: Option<TopicStatus>) -> Result<Vec<Topic>> {
    let status = status.map(|s| s.as_str());
    let rows = sqlx::query("SELECT * FROM topics WHERE (? IS NULL OR status = ?) ORDER BY id")
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await?;

    rows.iter().map(topic_from_row).collect()
}

/// Oldest open topic already holding a report with this category and subcategory
pub async fn find_open_topic_for(
    pool: &SqlitePool,
    category: &str,
    subcategory: &str,
) -> Result<Option<Topic>> {
    let row = sqlx::query(
        r#"
        SELECT t.* FROM topics t
        WHERE t.status IN (?, ?, ?)
          AND EXISTS (
              SELECT 1 FROM reports r
              WHERE r.topic_id = t.id AND r.category = ? AND r.subcategory = ?
          )
        ORDER BY t.id
        LIMIT 1
        "#,
    )
    .bind(TopicStatus::OPEN[0].as_str())
    .bind(TopicStatus::OPEN[1].as_str())
    .bind(TopicStatus::OPEN[2].as_str())
    .bind(category)
    .bind(subcategory)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(topic_from_row).transpose()
}

/// Write the fields recomputed by a consolidation
pub async fn update_triage_fields(
    pool: &SqlitePool,
    id: i64,
    priority: &Priority,
    status: TopicStatus,
    ai_summary: &str,
) -> Result<Topic> {
    let result = sqlx::query(
        r#"
        UPDATE topics
        SET priority = ?, status = ?, ai_summary = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(priority.as_str())
    .bind(status.as_str())
    .bind(ai_summary)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Topic {}", id)));
    }

    get_topic(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Topic {}", id)))
}

/// Record a commander action on a topic
pub async fn apply_action(
    pool: &SqlitePool,
    id: i64,
    status: TopicStatus,
    action: &str,
    final_solution: Option<&str>,
    feedback_message: Option<&str>,
) -> Result<Topic> {
    let result = sqlx::query(
        r#"
        UPDATE topics
        SET status = ?, action = ?, final_solution = ?, feedback_message = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(action)
    .bind(final_solution)
    .bind(feedback_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Topic {}", id)));
    }

    get_topic(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Topic {}", id)))
}

/// Replace the suggestion list
pub async fn set_suggestions(pool: &SqlitePool, id: i64, suggestions: &[Suggestion]) -> Result<()> {
    let encoded = serde_json::to_string(suggestions)?;

    let result = sqlx::query(
        "UPDATE topics SET suggestions = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(encoded)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Topic {}", id)));
    }

    Ok(())
}

/// Apply a partial edit and return the stored result
pub async fn update_topic(pool: &SqlitePool, id: i64, patch: TopicPatch) -> Result<Topic> {
    let current = get_topic(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Topic {}", id)))?;

    sqlx::query(
        r#"
        UPDATE topics SET
            title = ?, ai_summary = ?, status = ?, priority = ?, impact_type = ?,
            final_solution = ?, feedback_message = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(patch.title.unwrap_or(current.title))
    .bind(patch.ai_summary.unwrap_or(current.ai_summary))
    .bind(patch.status.unwrap_or(current.status).as_str())
    .bind(String::from(patch.priority.unwrap_or(current.priority)))
    .bind(patch.impact_type.unwrap_or(current.impact_type).as_str())
    .bind(patch.final_solution.or(current.final_solution))
    .bind(patch.feedback_message.or(current.feedback_message))
    .bind(id)
    .execute(pool)
    .await?;

    get_topic(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Topic {}", id)))
}

pub async fn count_topics(pool: &SqlitePool) -> Result<TopicCounts> {
    let (total, consolidated, critical, resolved): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN status = 'validated' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN priority = 'high' OR status = 'priority_alert' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status IN ('approved', 'archived') THEN 1 ELSE 0 END), 0)
        FROM topics
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(TopicCounts {
        total,
        consolidated,
        critical,
        resolved,
    })
}
