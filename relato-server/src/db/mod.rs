//! Store access for relato-server
//!
//! Plain async functions over a `SqlitePool`, one module per table.
//! No transactions span modules: each function is one or a few statements.

pub mod dump;
pub mod feedback;
pub mod reports;
pub mod settings;
pub mod topics;
pub mod users;

/// Map a unique-constraint violation to a `Conflict`, anything else to `Database`
pub(crate) fn map_unique_violation(err: sqlx::Error, what: &str) -> relato_common::Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            relato_common::Error::Conflict(format!("{} already exists", what))
        }
        _ => relato_common::Error::Database(err),
    }
}
