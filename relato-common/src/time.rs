//! Timestamp utilities

use chrono::{DateTime, Datelike, Local, Months, NaiveDate, NaiveDateTime, Utc};

/// Storage format of `created_at`-style columns (matches SQLite `CURRENT_TIMESTAMP`)
pub const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC time as seconds since the Unix epoch
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Today's date in the server's local timezone
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a date the Brazilian way (`DD/MM/YYYY`), as used in summary notes
pub fn format_br_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Format a timestamp for comparison against SQLite text timestamps
pub fn to_db_timestamp(ts: NaiveDateTime) -> String {
    ts.format(DB_TIMESTAMP_FORMAT).to_string()
}

/// Calendar month window `[start, end)` that lies `months_back` months before `reference`
///
/// `months_back = 0` is the month containing `reference`.
pub fn month_window(reference: NaiveDate, months_back: u32) -> (NaiveDateTime, NaiveDateTime) {
    let first_of_month = reference.with_day(1).unwrap_or(reference);
    let start = first_of_month
        .checked_sub_months(Months::new(months_back))
        .unwrap_or(first_of_month);
    let end = start.checked_add_months(Months::new(1)).unwrap_or(start);

    (
        start.and_hms_opt(0, 0, 0).unwrap_or_default(),
        end.and_hms_opt(0, 0, 0).unwrap_or_default(),
    )
}

/// Short upper-case month label (`JAN`, `FEB`, ...)
pub fn month_label(start: NaiveDateTime) -> String {
    start.format("%b").to_string().to_uppercase()
}
