//! Mock database client for testing.
//!
//! Keeps an in-memory, mutable table store so tests can observe that failed
//! writes leave table contents unchanged while committed writes do not.

use super::{DatabaseClient, DatabaseInfo, TabularResult, TableInfo, Value};
use crate::error::{Result, WardenError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// A mock database client backed by named in-memory tables.
///
/// Reads resolve the table from the `FROM <name>` clause. Successful
/// `INSERT INTO <name>` statements append a placeholder row and
/// `DELETE FROM <name>` clears the table, so row counts reflect committed
/// writes. When `fail_writes` is set, writes error without mutating anything.
#[derive(Default)]
pub struct MockDatabaseClient {
    tables: Mutex<HashMap<String, TabularResult>>,
    fail_writes: bool,
}

impl MockDatabaseClient {
    /// Creates a new mock client with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named table with the given contents.
    pub fn with_table(self, name: impl Into<String>, result: TabularResult) -> Self {
        self.tables
            .lock()
            .expect("mock table store poisoned")
            .insert(name.into(), result);
        self
    }

    /// Makes every write statement fail before commit.
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Extracts the table name following `keyword` in the statement.
    fn table_after_keyword(sql: &str, keyword: &str) -> Option<String> {
        let upper = sql.to_uppercase();
        let pos = upper.find(keyword)?;
        sql[pos + keyword.len()..]
            .split_whitespace()
            .next()
            .map(|name| name.trim_end_matches(';').trim_matches('`').to_string())
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<DatabaseInfo> {
        let tables = self.tables.lock().expect("mock table store poisoned");
        let mut infos: Vec<TableInfo> = tables
            .iter()
            .map(|(name, result)| TableInfo {
                name: name.clone(),
                columns: result
                    .columns
                    .iter()
                    .map(|col| super::ColumnInfo::new(col, "text"))
                    .collect(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(DatabaseInfo::new("mockdb", infos))
    }

    async fn fetch_read(&self, sql: &str) -> Result<TabularResult> {
        let table_name = Self::table_after_keyword(sql, "FROM ")
            .ok_or_else(|| WardenError::execution(format!("Cannot parse table from: {sql}")))?;

        let tables = self.tables.lock().expect("mock table store poisoned");
        tables
            .get(&table_name)
            .cloned()
            .ok_or_else(|| WardenError::execution(format!("Table '{table_name}' doesn't exist")))
    }

    async fn execute_write(&self, sql: &str) -> Result<()> {
        if self.fail_writes {
            return Err(WardenError::execution(
                "Statement rejected by backend (simulated)",
            ));
        }

        let mut tables = self.tables.lock().expect("mock table store poisoned");
        let upper = sql.trim_start().to_uppercase();

        if upper.starts_with("INSERT") {
            let table_name = Self::table_after_keyword(sql, "INTO ")
                .ok_or_else(|| WardenError::execution(format!("Cannot parse table from: {sql}")))?;
            let table = tables.get_mut(&table_name).ok_or_else(|| {
                WardenError::execution(format!("Table '{table_name}' doesn't exist"))
            })?;
            let placeholder = vec![Value::Null; table.columns.len()];
            table.rows.push(placeholder);
        } else if upper.starts_with("DELETE") {
            let table_name = Self::table_after_keyword(sql, "FROM ")
                .ok_or_else(|| WardenError::execution(format!("Cannot parse table from: {sql}")))?;
            let table = tables.get_mut(&table_name).ok_or_else(|| {
                WardenError::execution(format!("Table '{table_name}' doesn't exist"))
            })?;
            table.rows.clear();
        }
        // UPDATE/CREATE/DROP are accepted as successful no-ops.

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client where every call fails with a connection error.
#[derive(Debug, Default)]
pub struct FailingDatabaseClient;

impl FailingDatabaseClient {
    /// Creates a new failing client.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn introspect_schema(&self) -> Result<DatabaseInfo> {
        Err(WardenError::connection("Simulated connection failure"))
    }

    async fn fetch_read(&self, _sql: &str) -> Result<TabularResult> {
        Err(WardenError::execution("Simulated backend failure"))
    }

    async fn execute_write(&self, _sql: &str) -> Result<()> {
        Err(WardenError::execution("Simulated backend failure"))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_table() -> TabularResult {
        TabularResult::new(
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec![Value::Int(1), Value::String("Alice".to_string())],
                vec![Value::Int(2), Value::String("Bob".to_string())],
            ],
        )
    }

    #[tokio::test]
    async fn test_mock_read_known_table() {
        let client = MockDatabaseClient::new().with_table("users", users_table());
        let result = client.fetch_read("SELECT * FROM users").await.unwrap();
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.columns, vec!["id", "name"]);
    }

    #[tokio::test]
    async fn test_mock_read_unknown_table_errors() {
        let client = MockDatabaseClient::new();
        let result = client.fetch_read("SELECT * FROM ghosts").await;
        assert!(matches!(result, Err(WardenError::Execution(_))));
    }

    #[tokio::test]
    async fn test_mock_insert_appends_row() {
        let client = MockDatabaseClient::new().with_table("users", users_table());
        client
            .execute_write("INSERT INTO users (name) VALUES ('x')")
            .await
            .unwrap();
        let result = client.fetch_read("SELECT * FROM users").await.unwrap();
        assert_eq!(result.row_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_failing_writes_leave_table_unchanged() {
        let client = MockDatabaseClient::new()
            .with_table("users", users_table())
            .with_failing_writes();

        let write = client
            .execute_write("INSERT INTO users (name) VALUES ('x')")
            .await;
        assert!(write.is_err());

        let result = client.fetch_read("SELECT * FROM users").await.unwrap();
        assert_eq!(result.row_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_introspection() {
        let client = MockDatabaseClient::new().with_table("users", users_table());
        let info = client.introspect_schema().await.unwrap();
        assert_eq!(info.database_name, "mockdb");
        assert_eq!(info.table_count, 1);
        assert_eq!(info.tables[0].name, "users");
    }

    #[tokio::test]
    async fn test_failing_client() {
        let client = FailingDatabaseClient::new();
        assert!(client.fetch_read("SELECT 1").await.is_err());
        assert!(client.execute_write("DROP TABLE x").await.is_err());
    }
}
