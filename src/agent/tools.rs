//! The two named query actions exposed to the tool-calling loop.
//!
//! `execute_read_query` and `execute_write_query` wrap the validator, the
//! executor, and the shared history behind fixed textual contracts. The tool
//! boundary never returns an error: the consumer is a text-reasoning loop
//! that cannot catch exceptions, so every outcome, including validation and
//! execution failures, is rendered as descriptive text.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::history::ResultHistory;
use crate::llm::ToolDefinition;
use crate::query::QueryExecutor;
use crate::safety::{self, QueryClass, ValidationOutcome};

/// Default maximum number of rows rendered into a tool payload.
pub const DEFAULT_MAX_ROWS_OUT: usize = 100;

/// Tool name for the read action.
pub const READ_TOOL: &str = "execute_read_query";

/// Tool name for the write action.
pub const WRITE_TOOL: &str = "execute_write_query";

/// Arguments accepted by both query tools.
#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

/// Adapter exposing the executor and history as two named tool actions.
pub struct ToolAdapter {
    executor: Arc<QueryExecutor>,
    history: Arc<Mutex<ResultHistory>>,
    max_rows_out: usize,
}

impl ToolAdapter {
    /// Creates an adapter over the shared executor and history.
    pub fn new(executor: Arc<QueryExecutor>, history: Arc<Mutex<ResultHistory>>) -> Self {
        Self {
            executor,
            history,
            max_rows_out: DEFAULT_MAX_ROWS_OUT,
        }
    }

    /// Overrides the row cap for tool payload previews.
    pub fn with_max_rows_out(mut self, max_rows_out: usize) -> Self {
        self.max_rows_out = max_rows_out;
        self
    }

    /// Returns the tool definitions for the agent loop.
    pub fn definitions() -> Vec<ToolDefinition> {
        let parameters = serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The SQL query to execute"
                }
            },
            "required": ["query"]
        });

        vec![
            ToolDefinition {
                name: READ_TOOL.to_string(),
                description: "Execute a read-only SQL query (SELECT). Returns the position the \
                              result was stored at, along with the top rows of the result as a \
                              JSON string."
                    .to_string(),
                parameters: parameters.clone(),
            },
            ToolDefinition {
                name: WRITE_TOOL.to_string(),
                description: "Execute a SQL write query (INSERT, UPDATE, DELETE, CREATE, or \
                              DROP). Returns a success message, or the error message if the \
                              statement failed."
                    .to_string(),
                parameters,
            },
        ]
    }

    /// Dispatches a tool call by name and returns its text payload.
    ///
    /// Never returns an error; unknown tools and malformed arguments are
    /// reported as text like any other failure.
    pub async fn execute_tool(&self, name: &str, arguments: &str) -> String {
        let start = Instant::now();
        debug!(tool_name = name, "Executing tool");

        // The name decides the contract before the arguments are trusted:
        // an unknown tool is reported as such even with malformed arguments.
        let payload = match name {
            READ_TOOL | WRITE_TOOL => match serde_json::from_str::<QueryArgs>(arguments) {
                Ok(args) if name == READ_TOOL => self.run_read(&args.query).await,
                Ok(args) => self.run_write(&args.query).await,
                Err(e) => format!("Error: invalid tool arguments: {e}"),
            },
            _ => {
                warn!(tool_name = name, "Unknown tool requested");
                format!("Error: unknown tool: {name}")
            }
        };

        debug!(
            tool_name = name,
            duration_ms = start.elapsed().as_millis() as u64,
            payload_len = payload.len(),
            "Tool execution complete"
        );

        payload
    }

    /// Runs the read action: validate, execute, record, render.
    async fn run_read(&self, query: &str) -> String {
        if let ValidationOutcome::Invalid(reason) = safety::validate(query, QueryClass::Read) {
            return format!("Error: {reason}. Only a single SELECT query is allowed for this tool.");
        }

        let result = match self.executor.execute_read(query).await {
            Ok(result) => result,
            Err(e) => return format!("Error executing query: {e}"),
        };

        let total_rows = result.row_count();
        let preview = match result.to_json_columns(self.max_rows_out) {
            Ok(json) => json,
            Err(e) => return format!("Error rendering result: {e}"),
        };

        let position = self
            .history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_read(query, result);

        let mut payload = format!(
            "Query executed successfully. Result stored at position {position}.\nResults:\n{preview}"
        );
        if total_rows > self.max_rows_out {
            payload.push_str(&format!(
                "\nNote: only the top {} rows are shown here. Total rows in the result: {}.",
                self.max_rows_out, total_rows
            ));
        }
        payload
    }

    /// Runs the write action: validate, execute, record.
    async fn run_write(&self, query: &str) -> String {
        if let ValidationOutcome::Invalid(reason) = safety::validate(query, QueryClass::Write) {
            return format!(
                "Error: {reason}. Only a single INSERT, UPDATE, DELETE, CREATE, or DROP \
                 statement is allowed for this tool."
            );
        }

        if let Err(e) = self.executor.execute_write(query).await {
            return format!("Error executing query: {e}");
        }

        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_write(query);

        "Data written successfully!".to_string()
    }
}
