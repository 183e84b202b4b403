//! Request dispatchers and the uniform response shape.
//!
//! Two entry points produce the same [`DispatchResponse`]: the direct
//! dispatcher runs one validated SQL statement as-is, and the agent
//! dispatcher hands a natural-language request to the tool-calling loop.
//! Every failure on either path flows through the [`ErrorAdvisor`], so an
//! error response always carries an explanation.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{info, warn};

use crate::agent::advisor::ErrorAdvisor;
use crate::agent::runner::AgentRunner;
use crate::agent::tools::{ToolAdapter, DEFAULT_MAX_ROWS_OUT};
use crate::db::TabularResult;
use crate::history::{QueryRecord, ResultHistory};
use crate::llm::{prompt, LlmClient};
use crate::query::QueryExecutor;
use crate::safety::{self, QueryClass, ValidationOutcome};

/// Which path produced a response and whether it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Read,
    Write,
    Error,
}

/// The uniform result of a dispatched request.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResponse {
    /// Outcome class of the request.
    pub mode: ResponseMode,
    /// The SQL that was run or attempted; on the agent's error path, the
    /// original natural-language input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Tabular data for successful reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabular_output: Option<TabularResult>,
    /// Narrative text for the user.
    pub narrative: String,
    /// Advisory explanation, present exactly when `mode` is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_explanation: Option<String>,
}

impl DispatchResponse {
    fn read(query: impl Into<String>, result: TabularResult, narrative: impl Into<String>) -> Self {
        Self {
            mode: ResponseMode::Read,
            query: Some(query.into()),
            tabular_output: Some(result),
            narrative: narrative.into(),
            error_explanation: None,
        }
    }

    fn write(query: impl Into<String>, narrative: impl Into<String>) -> Self {
        Self {
            mode: ResponseMode::Write,
            query: Some(query.into()),
            tabular_output: None,
            narrative: narrative.into(),
            error_explanation: None,
        }
    }

    fn error(
        query: Option<String>,
        narrative: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            mode: ResponseMode::Error,
            query,
            tabular_output: None,
            narrative: narrative.into(),
            error_explanation: Some(explanation.into()),
        }
    }
}

fn lock_history(history: &Mutex<ResultHistory>) -> MutexGuard<'_, ResultHistory> {
    history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs a single SQL statement submitted verbatim by the user.
pub struct DirectDispatcher {
    executor: Arc<QueryExecutor>,
    history: Arc<Mutex<ResultHistory>>,
    llm: Box<dyn LlmClient>,
}

impl DirectDispatcher {
    pub fn new(
        executor: Arc<QueryExecutor>,
        history: Arc<Mutex<ResultHistory>>,
        llm: Box<dyn LlmClient>,
    ) -> Self {
        Self {
            executor,
            history,
            llm,
        }
    }

    /// Classifies, validates, and executes one statement.
    ///
    /// Results are never truncated on this path: the user asked for exactly
    /// this query and gets exactly its output.
    pub async fn run(&self, query: &str) -> DispatchResponse {
        let class = safety::classify(query);
        info!(%class, "Dispatching direct query");

        if class == QueryClass::Unknown {
            return self
                .fail(query, "query does not start with a recognized SQL keyword")
                .await;
        }

        if let ValidationOutcome::Invalid(reason) = safety::validate(query, class) {
            warn!(%reason, "Direct query rejected by validation");
            return self.fail(query, &reason.to_string()).await;
        }

        match class {
            QueryClass::Read => match self.executor.execute_read(query).await {
                Ok(result) => {
                    lock_history(&self.history).record_read(query, result.clone());
                    DispatchResponse::read(query, result, "No agent used.")
                }
                Err(e) => self.fail(query, &e.to_string()).await,
            },
            QueryClass::Write => match self.executor.execute_write(query).await {
                Ok(()) => {
                    lock_history(&self.history).record_write(query);
                    DispatchResponse::write(query, "No agent used.")
                }
                Err(e) => self.fail(query, &e.to_string()).await,
            },
            QueryClass::Unknown => unreachable!("unknown class handled above"),
        }
    }

    async fn fail(&self, query: &str, error: &str) -> DispatchResponse {
        let schema = schema_summary(&self.executor).await;
        let advice = ErrorAdvisor::new(self.llm.as_ref())
            .explain(query, error, &schema)
            .await;
        DispatchResponse::error(Some(query.to_string()), "Error in query.", advice)
    }
}

/// Hands a natural-language request to the bounded tool-calling loop.
pub struct AgentDispatcher {
    executor: Arc<QueryExecutor>,
    history: Arc<Mutex<ResultHistory>>,
    llm: Box<dyn LlmClient>,
    max_rows_out: usize,
}

impl AgentDispatcher {
    pub fn new(
        executor: Arc<QueryExecutor>,
        history: Arc<Mutex<ResultHistory>>,
        llm: Box<dyn LlmClient>,
    ) -> Self {
        Self {
            executor,
            history,
            llm,
            max_rows_out: DEFAULT_MAX_ROWS_OUT,
        }
    }

    /// Overrides the row cap applied to agent-path read results.
    pub fn with_max_rows_out(mut self, max_rows_out: usize) -> Self {
        self.max_rows_out = max_rows_out;
        self
    }

    /// Runs the agent loop and reconciles its outcome with the query history.
    ///
    /// The loop's own narrative describes what the model claims it did; the
    /// history records what was actually executed. The response is composed
    /// from the latter.
    pub async fn run(&self, input: &str) -> DispatchResponse {
        let info = match self.executor.introspect_schema().await {
            Ok(info) => info,
            Err(e) => return self.fail(input, &e.to_string()).await,
        };

        let messages = prompt::build_agent_messages(&info, input);
        // Eviction can land len() back on its old value after a successful
        // insert, so the snapshot uses the monotonic insertion counter.
        let baseline = lock_history(&self.history).insertions();

        let tools = ToolAdapter::new(Arc::clone(&self.executor), Arc::clone(&self.history))
            .with_max_rows_out(self.max_rows_out);
        let runner = AgentRunner::new(self.llm.as_ref(), &tools);

        let narrative = match runner.run(messages).await {
            Ok(narrative) => narrative,
            Err(e) => return self.fail(input, &e.to_string()).await,
        };

        let record = {
            let history = lock_history(&self.history);
            if history.insertions() == baseline {
                None
            } else {
                history.latest().cloned()
            }
        };

        match record {
            Some(QueryRecord {
                class: QueryClass::Read,
                query,
                result: Some(result),
            }) => {
                let (result, truncated_from) = self.truncate(result);
                let narrative = match truncated_from {
                    Some(total) => format!(
                        "{narrative}\nShowing the first {} of {} rows.",
                        self.max_rows_out, total
                    ),
                    None => narrative,
                };
                DispatchResponse::read(query, result, narrative)
            }
            Some(QueryRecord { query, .. }) => DispatchResponse::write(query, narrative),
            // The loop finished without executing anything, so there is no
            // structured outcome to pair the narrative with.
            None => self.fail(input, "the agent produced no executed query").await,
        }
    }

    /// Caps a result at `max_rows_out` rows, returning the original row
    /// count when rows were dropped.
    fn truncate(&self, result: TabularResult) -> (TabularResult, Option<usize>) {
        let total = result.row_count();
        if total <= self.max_rows_out {
            return (result, None);
        }
        let mut rows = result.rows;
        rows.truncate(self.max_rows_out);
        (TabularResult::new(result.columns, rows), Some(total))
    }

    async fn fail(&self, input: &str, error: &str) -> DispatchResponse {
        let schema = schema_summary(&self.executor).await;
        let advice = ErrorAdvisor::new(self.llm.as_ref())
            .explain(input, error, &schema)
            .await;
        DispatchResponse::error(Some(input.to_string()), "Error in input.", advice)
    }
}

async fn schema_summary(executor: &QueryExecutor) -> String {
    match executor.introspect_schema().await {
        Ok(info) => info.format_for_prompt(),
        Err(_) => "(schema unavailable)".to_string(),
    }
}
