//! Database abstraction layer for querywarden.
//!
//! Provides a trait-based interface over the backing database so the
//! execution layer can run against MySQL in production and an in-memory
//! mock in tests.

mod mock;
mod mysql;
mod schema;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use mysql::MySqlClient;
pub use schema::{ColumnInfo, DatabaseInfo, TableInfo};
pub use types::{Row, TabularResult, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for database clients.
///
/// All operations are async and return Results with WardenError. Reads and
/// writes use a freshly scoped connection per call; no connection or open
/// transaction survives a call boundary.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the database, returning its structured description.
    async fn introspect_schema(&self) -> Result<DatabaseInfo>;

    /// Executes a read query and materializes all rows into a result.
    async fn fetch_read(&self, sql: &str) -> Result<TabularResult>;

    /// Executes a write statement, committing only after it succeeds.
    async fn execute_write(&self, sql: &str) -> Result<()>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Connects to the configured MySQL database.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    let client = MySqlClient::connect(config).await?;
    Ok(Box::new(client))
}
