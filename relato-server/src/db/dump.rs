//! SQL dump of the domain tables
//!
//! Produces one `INSERT` per row for users, reports, topics and feedback,
//! in that order so the output replays cleanly against a fresh schema.

use relato_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

/// Tables written by [`dump_sql`], in replay order
pub const DUMP_TABLES: [&str; 4] = ["users", "topics", "reports", "feedback"];

/// Render every row of the domain tables as SQL `INSERT` statements
pub async fn dump_sql(pool: &SqlitePool) -> Result<String> {
    let mut sql = String::new();

    for table in DUMP_TABLES {
        let rows = sqlx::query(&format!("SELECT * FROM {} ORDER BY id", table))
            .fetch_all(pool)
            .await?;

        sql.push_str(&format!("-- Data for {}\n", table));
        for row in &rows {
            sql.push_str(&insert_statement(table, row)?);
            sql.push('\n');
        }
        sql.push('\n');
    }

    Ok(sql)
}

fn insert_statement(table: &str, row: &SqliteRow) -> Result<String> {
    let columns: Vec<&str> = row.columns().iter().map(|c| c.name()).collect();
    let values = (0..columns.len())
        .map(|i| sql_literal(row, i))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        columns.join(", "),
        values.join(", ")
    ))
}

/// SQL literal for one column, chosen by the stored value's storage class
fn sql_literal(row: &SqliteRow, index: usize) -> Result<String> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok("NULL".to_string());
    }

    let literal = match raw.type_info().name() {
        "INTEGER" => row.try_get::<i64, _>(index)?.to_string(),
        "REAL" => row.try_get::<f64, _>(index)?.to_string(),
        "BLOB" => format!("X'{}'", hex::encode(row.try_get::<Vec<u8>, _>(index)?)),
        _ => quote_text(&row.try_get::<String, _>(index)?),
    };

    Ok(literal)
}

fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
