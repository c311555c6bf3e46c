//! Database connection, transactions and query execution.

use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool,
    SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row as _, Sqlite, Transaction, TypeInfo, ValueRef};

use crate::{DbError, QueryResult, Row, Value};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// How long a writer waits on a locked database file before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database handle backed by a connection pool.
///
/// Provides type-safe query execution with automatic result deserialization.
/// Cloning is cheap; clones share the pool.
#[derive(Clone, Debug)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (creating if missing) the SQLite database at `url`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let db = Db::open("sqlite:bookstore.db").await?;
    /// ```
    pub async fn open(url: &str) -> Result<Self, DbError> {
        if url.contains(":memory:") {
            return Self::open_in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DbError::OpenError(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| DbError::OpenError(e.to_string()))?;

        tracing::debug!(url, "opened sqlite database");
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds exactly one connection that is never recycled, so every
    /// query and transaction sees the same database.
    pub async fn open_in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::OpenError(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::OpenError(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Execute a SQL statement that doesn't return rows.
    ///
    /// Returns the number of rows affected.
    ///
    /// ```rust,ignore
    /// db.execute(
    ///     "INSERT INTO categories (name, description) VALUES (?, ?)",
    ///     params!["Fiction", "Made-up stories"]
    /// ).await?;
    /// ```
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        let mut conn = self.pool.acquire().await?;
        execute_on(&mut *conn, sql, params).await
    }

    /// Execute a SQL query and return raw results.
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_on(&mut *conn, sql, params).await
    }

    /// Execute a SQL query and deserialize results into a vector.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<T>, DbError> {
        self.query(sql, params).await?.deserialize_all()
    }

    /// Execute a SQL query and return an optional single row.
    pub async fn query_optional<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<T>, DbError> {
        first_row(self.query(sql, params).await?)
    }

    /// Start a transaction.
    ///
    /// Dropping the returned [`Tx`] without calling [`Tx::commit`] rolls it back.
    pub async fn begin(&self) -> Result<Tx, DbError> {
        let inner = self.pool.begin().await?;
        Ok(Tx { inner })
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// An open database transaction.
///
/// Exposes the same query surface as [`Db`]; every statement runs on the
/// transaction's connection.
pub struct Tx {
    inner: Transaction<'static, Sqlite>,
}

impl Tx {
    /// Execute a statement inside the transaction, returning rows affected.
    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        execute_on(&mut *self.inner, sql, params).await
    }

    /// Execute a query inside the transaction.
    pub async fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult, DbError> {
        fetch_on(&mut *self.inner, sql, params).await
    }

    /// Execute a query and deserialize every row.
    pub async fn query_as<T: DeserializeOwned>(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<T>, DbError> {
        self.query(sql, params).await?.deserialize_all()
    }

    /// Execute a query and return exactly one row.
    ///
    /// Returns [`DbError::NotFound`] if no rows are returned.
    pub async fn query_one<T: DeserializeOwned>(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<T, DbError> {
        self.query_optional(sql, params)
            .await?
            .ok_or(DbError::NotFound)
    }

    /// Execute a query and return an optional single row.
    pub async fn query_optional<T: DeserializeOwned>(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<T>, DbError> {
        first_row(self.query(sql, params).await?)
    }

    /// Rowid of the last row inserted on this transaction's connection.
    pub async fn last_insert_id(&mut self) -> Result<i64, DbError> {
        let result = self.query("SELECT last_insert_rowid() AS id", &[]).await?;
        result
            .first()
            .and_then(|row| row.get("id"))
            .and_then(Value::as_integer)
            .ok_or(DbError::NotFound)
    }

    /// Commit the transaction.
    pub async fn commit(self) -> Result<(), DbError> {
        self.inner.commit().await?;
        Ok(())
    }

    /// Roll back explicitly instead of waiting for drop.
    pub async fn rollback(self) -> Result<(), DbError> {
        self.inner.rollback().await?;
        Ok(())
    }
}

async fn execute_on(
    conn: &mut SqliteConnection,
    sql: &str,
    params: &[Value],
) -> Result<u64, DbError> {
    tracing::trace!(sql, params = params.len(), "execute");
    let result = bind_all(sqlx::query(sql), params).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

async fn fetch_on(
    conn: &mut SqliteConnection,
    sql: &str,
    params: &[Value],
) -> Result<QueryResult, DbError> {
    tracing::trace!(sql, params = params.len(), "query");
    let rows = bind_all(sqlx::query(sql), params)
        .fetch_all(&mut *conn)
        .await?;

    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(|row| convert_row(&columns, row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QueryResult::new(columns, rows))
}

fn first_row<T: DeserializeOwned>(result: QueryResult) -> Result<Option<T>, DbError> {
    match result.first() {
        Some(row) => Ok(Some(row.deserialize()?)),
        None => Ok(None),
    }
}

fn bind_all<'q>(mut query: SqliteQuery<'q>, params: &[Value]) -> SqliteQuery<'q> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Integer(i) => query.bind(*i),
            Value::Real(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.clone()),
            Value::Blob(b) => query.bind(b.clone()),
        };
    }
    query
}

fn convert_row(columns: &[String], row: &SqliteRow) -> Result<Row, DbError> {
    let mut values = Vec::with_capacity(columns.len());

    for index in 0..columns.len() {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            values.push(Value::Null);
            continue;
        }

        let type_name = raw.type_info().name().to_ascii_uppercase();
        let value = match type_name.as_str() {
            "INTEGER" | "INT" | "INT8" | "BIGINT" | "BOOLEAN" => Value::Integer(row.try_get(index)?),
            "REAL" | "FLOAT" | "DOUBLE" => Value::Real(row.try_get(index)?),
            "BLOB" => Value::Blob(row.try_get(index)?),
            _ => Value::Text(row.try_get(index)?),
        };
        values.push(value);
    }

    Ok(Row::new(columns.to_vec(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Author {
        id: i64,
        name: String,
        rating: Option<f64>,
    }

    async fn setup() -> Db {
        let db = Db::open_in_memory().await.unwrap();
        db.execute(
            "CREATE TABLE authors (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, rating REAL)",
            params![],
        )
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_insert_and_query_as() {
        let db = setup().await;
        let affected = db
            .execute(
                "INSERT INTO authors (name, rating) VALUES (?, ?)",
                params!["Le Guin", 4.5],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let authors: Vec<Author> = db
            .query_as("SELECT id, name, rating FROM authors", params![])
            .await
            .unwrap();
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].name, "Le Guin");
        assert_eq!(authors[0].rating, Some(4.5));
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let db = setup().await;
        {
            let mut tx = db.begin().await.unwrap();
            tx.execute("INSERT INTO authors (name) VALUES (?)", params!["Herbert"])
                .await
                .unwrap();
        }

        let found: Option<Author> = db
            .query_optional("SELECT id, name, rating FROM authors", params![])
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible() {
        let db = setup().await;
        let mut tx = db.begin().await.unwrap();
        tx.execute("INSERT INTO authors (name) VALUES (?)", params!["Herbert"])
            .await
            .unwrap();
        let id = tx.last_insert_id().await.unwrap();
        tx.commit().await.unwrap();

        let author: Option<Author> = db
            .query_optional(
                "SELECT id, name, rating FROM authors WHERE id = ?",
                params![id],
            )
            .await
            .unwrap();
        assert_eq!(author.map(|a| a.name), Some("Herbert".to_string()));
    }

    #[tokio::test]
    async fn test_unique_violation_is_constraint_error() {
        let db = setup().await;
        db.execute("INSERT INTO authors (name) VALUES (?)", params!["Herbert"])
            .await
            .unwrap();
        let err = db
            .execute("INSERT INTO authors (name) VALUES (?)", params!["Herbert"])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_query_one_reports_not_found() {
        let db = setup().await;
        let mut tx = db.begin().await.unwrap();
        let err = tx
            .query_one::<Author>("SELECT id, name, rating FROM authors", params![])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }
}
