//! MySQL database client implementation.
//!
//! Implements the `DatabaseClient` trait over sqlx. Each call acquires a
//! pooled connection for its own scope: reads materialize every row before
//! returning, writes run in an explicit transaction that commits only after
//! the statement succeeds. A write that fails before commit is rolled back
//! when the transaction drops.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseClient, DatabaseInfo, Row, TabularResult, TableInfo, Value};
use crate::error::{Result, WardenError};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
    database_name: String,
}

impl MySqlClient {
    /// Connects to the database described by `config`.
    ///
    /// Transient connection failures are retried with exponential backoff;
    /// authentication and unknown-database failures are reported immediately.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string();

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            let result = MySqlPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(10))
                .connect(&conn_str)
                .await;

            match result {
                Ok(pool) => {
                    debug!("Successfully connected to {}", config.display_string());
                    return Ok(Self {
                        pool,
                        database_name: config.database.clone(),
                    });
                }
                Err(e) => {
                    let is_transient = is_transient_error(&e);
                    last_error = Some(e);

                    // Auth and unknown-database failures will not heal on
                    // retry; report them immediately.
                    if !is_transient || attempt >= MAX_RETRY_ATTEMPTS {
                        break;
                    }

                    warn!(
                        "Connection attempt {} failed (transient error), retrying in {:?}",
                        attempt, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }

        Err(map_connection_error(
            last_error.expect("at least one attempt was made"),
            config,
        ))
    }

    /// Creates a client from an existing connection pool.
    ///
    /// This is primarily useful for testing.
    #[allow(dead_code)]
    pub fn from_pool(pool: MySqlPool, database_name: impl Into<String>) -> Self {
        Self {
            pool,
            database_name: database_name.into(),
        }
    }

    /// Fetches all tables of the connected database with their columns.
    async fn fetch_tables(&self) -> Result<Vec<TableInfo>> {
        let table_names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = ? AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .bind(&self.database_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| WardenError::execution(format!("Failed to fetch tables: {e}")))?;

        let mut tables = Vec::with_capacity(table_names.len());

        for table_name in table_names {
            let columns = self.fetch_columns(&table_name).await?;
            tables.push(TableInfo {
                name: table_name,
                columns,
            });
        }

        Ok(tables)
    }

    /// Fetches columns for a specific table.
    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnInfo>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT column_name, column_type
            FROM information_schema.columns
            WHERE table_schema = ? AND table_name = ?
            ORDER BY ordinal_position
            "#,
        )
        .bind(&self.database_name)
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            WardenError::execution(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type)| ColumnInfo { name, data_type })
            .collect())
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn introspect_schema(&self) -> Result<DatabaseInfo> {
        let tables = self.fetch_tables().await?;
        Ok(DatabaseInfo::new(self.database_name.clone(), tables))
    }

    async fn fetch_read(&self, sql: &str) -> Result<TabularResult> {
        let start = Instant::now();

        // The pooled connection is scoped to this call; it is returned to the
        // pool on every exit path when `conn` drops.
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| WardenError::connection(format!("Failed to acquire connection: {e}")))?;

        let result = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&mut *conn),
        )
        .await
        .map_err(|_| {
            WardenError::execution(format!("Query timed out after {QUERY_TIMEOUT_SECS} seconds"))
        })?
        .map_err(|e| WardenError::execution(e.to_string()))?;

        let columns: Vec<String> = result
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| col.name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let rows: Vec<Row> = result.iter().map(convert_row).collect();

        debug!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Read query complete"
        );

        Ok(TabularResult::new(columns, rows))
    }

    async fn execute_write(&self, sql: &str) -> Result<()> {
        let start = Instant::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| WardenError::connection(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| WardenError::execution(e.to_string()))?;

        // Commit only after the statement returned without error. On the
        // error path above, `tx` drops and rolls back.
        tx.commit()
            .await
            .map_err(|e| WardenError::execution(format!("Commit failed: {e}")))?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Write statement committed"
        );

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "INT UNSIGNED" | "BIGINT UNSIGNED" => row
            .try_get::<Option<u64>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "VARBINARY" | "BINARY" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // For all other types (VARCHAR, TEXT, DATE, DECIMAL, ...), fall back
        // to the string representation.
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Determines if a connection error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("timeout")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
    {
        return true;
    }

    false
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> WardenError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("access denied") {
        return WardenError::connection(format!(
            "Access denied for user '{}'. Check the username and password.",
            config.user
        ));
    }

    if error_str.contains("unknown database") {
        return WardenError::connection(format!(
            "Database '{}' does not exist on {}.",
            config.database, config.host
        ));
    }

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        return WardenError::connection(format!(
            "Cannot reach MySQL at {}. Is the server running?",
            config.host
        ));
    }

    WardenError::connection(error.to_string())
}
