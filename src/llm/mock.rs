//! Mock LLM client for testing.
//!
//! Tool-aware turns can be scripted in order, so tests can drive the agent
//! loop through an exact sequence of tool calls and a final answer. Plain
//! completions fall back to pattern-matched canned responses.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{Result, WardenError};
use crate::llm::types::{LlmResponse, Message};
use crate::llm::{LlmClient, ToolDefinition};

/// Mock LLM client with scripted tool turns and canned plain completions.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Scripted responses consumed in order by `complete_with_tools`.
    scripted_turns: Mutex<VecDeque<LlmResponse>>,
    /// Custom response mappings (pattern -> response) for `complete`.
    custom_responses: Vec<(String, String)>,
    /// Whether plain completions should fail (for advisor fallback tests).
    fail_completions: bool,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a scripted turn for the tool-calling path.
    ///
    /// Turns are consumed in order; when the script is exhausted the mock
    /// keeps returning a fixed final answer.
    pub fn with_turn(self, response: LlmResponse) -> Self {
        self.scripted_turns
            .lock()
            .expect("mock turn script poisoned")
            .push_back(response);
        self
    }

    /// Adds a custom response mapping for plain completions.
    ///
    /// When the last message contains `pattern`, the mock returns `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Makes both completion entry points fail with an LLM error.
    pub fn with_failing_completions(mut self) -> Self {
        self.fail_completions = true;
        self
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        if self.fail_completions {
            return Err(WardenError::llm("Simulated completion failure"));
        }

        let input = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return Ok(response.clone());
            }
        }

        Ok("Mock explanation: the query referenced something the schema does not contain. \
            Corrected version: SELECT 1"
            .to_string())
    }

    async fn complete_with_tools(
        &self,
        _messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        if self.fail_completions {
            return Err(WardenError::llm("Simulated completion failure"));
        }

        let mut turns = self
            .scripted_turns
            .lock()
            .expect("mock turn script poisoned");

        Ok(turns
            .pop_front()
            .unwrap_or_else(|| LlmResponse::text("Mock final answer.")))
    }
}
