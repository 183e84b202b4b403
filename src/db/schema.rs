//! Database schema introspection types.
//!
//! Represents the structured description of a database consumed by the
//! agent's system prompt and the error advisor: database name, table count,
//! and per-table column names and types.

use serde::{Deserialize, Serialize};

/// Structured description of a database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Name of the database.
    pub database_name: String,

    /// Number of tables in the database.
    pub table_count: usize,

    /// All tables with their columns.
    pub tables: Vec<TableInfo>,
}

/// A single table and its columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name.
    pub name: String,

    /// Columns in declaration order.
    pub columns: Vec<ColumnInfo>,
}

/// A single column of a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type as reported by the backend.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

impl DatabaseInfo {
    /// Creates an info for a database with the given tables.
    pub fn new(database_name: impl Into<String>, tables: Vec<TableInfo>) -> Self {
        Self {
            database_name: database_name.into(),
            table_count: tables.len(),
            tables,
        }
    }

    /// Formats the schema for inclusion in an LLM prompt.
    ///
    /// Produces a compact human-readable summary:
    ///
    /// ```text
    /// Database name: shop
    /// Total tables = 2
    /// Table-1 users: Columns = [id (int), name (varchar)]
    /// Table-2 orders: Columns = [id (int), user_id (int)]
    /// ```
    pub fn format_for_prompt(&self) -> String {
        let mut lines = vec![
            format!("Database name: {}", self.database_name),
            format!("Total tables = {}", self.table_count),
        ];

        for (i, table) in self.tables.iter().enumerate() {
            let column_list = table
                .columns
                .iter()
                .map(|col| format!("{} ({})", col.name, col.data_type))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(
                "Table-{} {}: Columns = [{}]",
                i + 1,
                table.name,
                column_list
            ));
        }

        lines.join("\n")
    }
}
