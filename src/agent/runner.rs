//! The bounded tool-calling loop.
//!
//! Each iteration sends the conversation to the model with the tool
//! definitions attached. When the model answers with tool calls, every call
//! is executed through the [`ToolAdapter`] and its text payload is appended
//! as a tool message before the next iteration. The loop terminates on the
//! first plain-text answer, or fails once the iteration bound is exhausted.

use tracing::{debug, info, warn};

use crate::agent::tools::ToolAdapter;
use crate::error::{Result, WardenError};
use crate::llm::{LlmClient, Message};

/// Hard upper bound on loop iterations, counting the initial request.
pub const MAX_AGENT_ITERATIONS: usize = 5;

/// Drives a conversation against the model until it produces a final answer.
pub struct AgentRunner<'a> {
    llm: &'a dyn LlmClient,
    tools: &'a ToolAdapter,
}

impl<'a> AgentRunner<'a> {
    pub fn new(llm: &'a dyn LlmClient, tools: &'a ToolAdapter) -> Self {
        Self { llm, tools }
    }

    /// Runs the loop over the given seed messages and returns the final
    /// narrative answer.
    pub async fn run(&self, mut messages: Vec<Message>) -> Result<String> {
        let definitions = ToolAdapter::definitions();

        for iteration in 0..MAX_AGENT_ITERATIONS {
            debug!(iteration, message_count = messages.len(), "Agent iteration");

            let response = self.llm.complete_with_tools(&messages, &definitions).await?;

            if !response.has_tool_calls() {
                info!(iteration, "Agent produced final answer");
                return Ok(response.content);
            }

            let tool_calls = response.tool_calls;
            messages.push(Message::assistant_with_tool_calls(
                response.content,
                tool_calls.clone(),
            ));

            for call in &tool_calls {
                debug!(tool_name = %call.name, "Agent requested tool");
                let payload = self.tools.execute_tool(&call.name, &call.arguments).await;
                messages.push(Message::tool(&call.id, payload));
            }
        }

        warn!(
            max_iterations = MAX_AGENT_ITERATIONS,
            "Agent loop exhausted its iteration bound"
        );
        Err(WardenError::loop_bound(format!(
            "no final answer after {MAX_AGENT_ITERATIONS} iterations"
        )))
    }
}
