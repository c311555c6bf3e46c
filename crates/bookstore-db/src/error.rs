//! Database error types.

use thiserror::Error;

/// Errors that can occur when using the database.
#[derive(Error, Debug)]
pub enum DbError {
    /// Failed to open the database.
    #[error("Failed to open database: {0}")]
    OpenError(String),

    /// Failed to execute a query.
    #[error("Query execution failed: {0}")]
    QueryError(String),

    /// Another connection holds the lock the statement needed.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// A unique, foreign key or check constraint rejected the write.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Failed to deserialize a row.
    #[error("Deserialization error: {0}")]
    DeserializeError(String),

    /// Type conversion error.
    #[error("Type conversion error: {0}")]
    TypeError(String),

    /// No rows returned when one was expected.
    #[error("No rows returned")]
    NotFound,
}

impl DbError {
    /// Whether the failure came from lock contention rather than a bad statement.
    pub fn is_busy(&self) -> bool {
        matches!(self, DbError::Busy(_))
    }
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::DeserializeError(e.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => {
                // SQLite reports extended result codes; the low byte is the primary code.
                let primary = db
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| code & 0xff);
                match primary {
                    Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => DbError::Busy(db.message().to_string()),
                    _ if db.is_unique_violation()
                        || db.is_foreign_key_violation()
                        || db.is_check_violation() =>
                    {
                        DbError::Constraint(db.message().to_string())
                    }
                    _ => DbError::QueryError(db.message().to_string()),
                }
            }
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::TypeError(format!("column {}: {}", index, source))
            }
            sqlx::Error::PoolTimedOut => DbError::Busy("timed out waiting for a connection".to_string()),
            other => DbError::QueryError(other.to_string()),
        }
    }
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::NotFound));
    }

    #[test]
    fn test_pool_timeout_is_busy() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_busy());
    }
}
