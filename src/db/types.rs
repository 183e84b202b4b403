//! Result-set types for querywarden.
//!
//! `TabularResult` is the fixed-shape value type produced by read queries:
//! ordered column names plus rows whose cells align positionally with the
//! columns. Results are immutable once produced; export to CSV and JSON is
//! done through explicit serialization functions.

use crate::error::{Result, WardenError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents the result of executing a read query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TabularResult {
    /// Ordered, order-significant column names.
    pub columns: Vec<String>,

    /// Rows of data, each aligned positionally with `columns`.
    pub rows: Vec<Row>,
}

impl TabularResult {
    /// Creates a result with the given columns and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Returns the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serializes the result to row-oriented CSV with a header line.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(&self.columns)
            .map_err(|e| WardenError::internal(format!("CSV serialization failed: {e}")))?;

        for row in &self.rows {
            let record: Vec<String> = row.iter().map(Value::to_display_string).collect();
            writer
                .write_record(&record)
                .map_err(|e| WardenError::internal(format!("CSV serialization failed: {e}")))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| WardenError::internal(format!("CSV serialization failed: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| WardenError::internal(format!("CSV output was not UTF-8: {e}")))
    }

    /// Serializes the result to a JSON array of row objects.
    pub fn to_json_records(&self) -> Result<String> {
        let records: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                let object: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .zip(row.iter())
                    .map(|(col, cell)| (col.clone(), cell.to_json()))
                    .collect();
                serde_json::Value::Object(object)
            })
            .collect();

        serde_json::to_string(&records)
            .map_err(|e| WardenError::internal(format!("JSON serialization failed: {e}")))
    }

    /// Serializes at most `limit` rows to a column-oriented JSON object
    /// (column name mapped to the list of its values).
    ///
    /// This is the compact rendering embedded in tool payloads for the agent.
    pub fn to_json_columns(&self, limit: usize) -> Result<String> {
        let object: serde_json::Map<String, serde_json::Value> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let values: Vec<serde_json::Value> = self
                    .rows
                    .iter()
                    .take(limit)
                    .map(|row| row.get(i).map(Value::to_json).unwrap_or(json!(null)))
                    .collect();
                (col.clone(), serde_json::Value::Array(values))
            })
            .collect();

        serde_json::to_string(&serde_json::Value::Object(object))
            .map_err(|e| WardenError::internal(format!("JSON serialization failed: {e}")))
    }
}

/// Represents a single value from a database cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts the value to a string representation for display and CSV.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    /// Converts the value to its JSON representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => json!(null),
            Value::Bool(b) => json!(b),
            Value::Int(i) => json!(i),
            Value::Float(f) => json!(f),
            Value::String(s) => json!(s),
            Value::Bytes(b) => json!(format!("<{} bytes>", b.len())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
