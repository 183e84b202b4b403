//! Validated query execution.
//!
//! The executor owns the live database client and runs queries that have
//! already been classified and validated. It adds timing and tracing but no
//! policy: classification and validation live in `safety`, recording lives
//! in `history`.

use std::time::Instant;

use crate::db::{DatabaseClient, DatabaseInfo, TabularResult};
use crate::error::Result;
use tracing::{debug, error};

/// Executes validated queries against the owned database client.
pub struct QueryExecutor {
    db: Box<dyn DatabaseClient>,
}

impl QueryExecutor {
    /// Creates an executor owning the given database client.
    pub fn new(db: Box<dyn DatabaseClient>) -> Self {
        Self { db }
    }

    /// Executes a validated read query, materializing the full result.
    ///
    /// The connection is scoped to this call and released on every exit path;
    /// a backend failure yields an execution error, never a partial result.
    pub async fn execute_read(&self, sql: &str) -> Result<TabularResult> {
        let start = Instant::now();
        let result = self.db.fetch_read(sql).await;

        match &result {
            Ok(tabular) => debug!(
                rows = tabular.row_count(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Read executed"
            ),
            Err(e) => error!("Read failed: {e}"),
        }

        result
    }

    /// Executes a validated write statement.
    ///
    /// The statement commits only after it returns without error; a failure
    /// before commit persists nothing (the scoped transaction rolls back).
    pub async fn execute_write(&self, sql: &str) -> Result<()> {
        let start = Instant::now();
        let result = self.db.execute_write(sql).await;

        match &result {
            Ok(()) => debug!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Write executed"
            ),
            Err(e) => error!("Write failed: {e}"),
        }

        result
    }

    /// Introspects the database schema.
    pub async fn introspect_schema(&self) -> Result<DatabaseInfo> {
        self.db.introspect_schema().await
    }

    /// Closes the underlying database connection.
    pub async fn close(&self) -> Result<()> {
        self.db.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MockDatabaseClient, TabularResult, Value};

    fn users_table() -> TabularResult {
        TabularResult::new(
            vec!["id".to_string()],
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        )
    }

    #[tokio::test]
    async fn test_execute_read_returns_full_result() {
        let db = MockDatabaseClient::new().with_table("users", users_table());
        let executor = QueryExecutor::new(Box::new(db));

        let result = executor.execute_read("SELECT * FROM users").await.unwrap();
        assert_eq!(result.row_count(), 2);
    }

    #[tokio::test]
    async fn test_execute_read_twice_is_stable() {
        let db = MockDatabaseClient::new().with_table("users", users_table());
        let executor = QueryExecutor::new(Box::new(db));

        let first = executor.execute_read("SELECT * FROM users").await.unwrap();
        let second = executor.execute_read("SELECT * FROM users").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_execute_write_success() {
        let db = MockDatabaseClient::new().with_table("users", users_table());
        let executor = QueryExecutor::new(Box::new(db));

        executor
            .execute_write("INSERT INTO users (id) VALUES (3)")
            .await
            .unwrap();

        let result = executor.execute_read("SELECT * FROM users").await.unwrap();
        assert_eq!(result.row_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_table_unchanged() {
        let db = MockDatabaseClient::new()
            .with_table("users", users_table())
            .with_failing_writes();
        let executor = QueryExecutor::new(Box::new(db));

        let write = executor
            .execute_write("INSERT INTO users (id) VALUES (3)")
            .await;
        assert!(write.is_err());

        let result = executor.execute_read("SELECT * FROM users").await.unwrap();
        assert_eq!(result.row_count(), 2);
    }
}
