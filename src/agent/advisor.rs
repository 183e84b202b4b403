//! Advisory error explanations.
//!
//! When a request fails, the advisor asks the model to explain what went
//! wrong against the live schema and to suggest a corrected query. The
//! advice is text for the user only; nothing it suggests is ever executed.

use tracing::{debug, warn};

use crate::llm::{LlmClient, Message};

/// Produces human-readable explanations for failed requests.
pub struct ErrorAdvisor<'a> {
    llm: &'a dyn LlmClient,
}

impl<'a> ErrorAdvisor<'a> {
    pub fn new(llm: &'a dyn LlmClient) -> Self {
        Self { llm }
    }

    /// Explains why `original_input` failed with `error`, against the given
    /// schema summary.
    ///
    /// Infallible by contract: if the model itself cannot be reached the
    /// advisory degrades to a fixed fallback string, so the error path of a
    /// dispatch never gains a second failure.
    pub async fn explain(&self, original_input: &str, error: &str, schema_summary: &str) -> String {
        let prompt = format!(
            "There was a problem processing the input: {original_input}\n\
             The error message was: {error}\n\
             Use this database information to find out what went wrong:\n\
             {schema_summary}\n\
             Mention the mistake in the input and write a corrected version of the query."
        );

        debug!(input_len = original_input.len(), "Requesting error advisory");

        match self.llm.complete(&[Message::user(prompt)]).await {
            Ok(advice) => advice,
            Err(e) => {
                warn!(error = %e, "Advisory request failed, using fallback");
                format!("No advisory available: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn test_explain_returns_model_advice() {
        let llm = MockLlmClient::new().with_response(
            "SELCT",
            "The keyword SELCT is misspelled. Corrected version: SELECT * FROM users",
        );
        let advisor = ErrorAdvisor::new(&llm);

        let advice = advisor
            .explain("SELCT * FROM users", "syntax error near SELCT", "Database name: shop")
            .await;
        assert!(advice.contains("Corrected version"));
    }

    #[tokio::test]
    async fn test_explain_never_fails() {
        let llm = MockLlmClient::new().with_failing_completions();
        let advisor = ErrorAdvisor::new(&llm);

        let advice = advisor
            .explain("SELECT 1", "connection lost", "(schema unavailable)")
            .await;
        assert!(advice.starts_with("No advisory available:"));
    }
}
