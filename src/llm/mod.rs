//! LLM integration for querywarden.
//!
//! The LLM is an opaque text-completion service with two entry points: a
//! plain completion (used by the error advisor) and a tool-aware completion
//! (used by the agent loop). Providers implement the `LlmClient` trait.

pub mod mock;
pub mod openai;
pub mod prompt;
pub mod types;

pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use prompt::{build_agent_messages, build_system_prompt};
pub use types::{LlmResponse, Message, Role, ToolCall, ToolResult};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// Declaration of a callable tool, consumable by a tool-calling LLM.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Trait for LLM clients.
///
/// Implementations must be thread-safe (Send + Sync) to support async
/// operations. Neither call imposes a timeout beyond the provider's own;
/// a hung provider hangs the dispatch.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a plain completion for the given messages.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Generates a completion that may request tool calls.
    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// OpenAI (chat completions API).
    #[default]
    OpenAi,
    /// Mock client for testing (no API key required).
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates an LLM client for the given provider.
///
/// The OpenAI provider reads its credentials from the environment.
pub fn create_client(provider: LlmProvider) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::OpenAi => Ok(Box::new(OpenAiClient::from_env()?)),
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!(
            "openai".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenAi
        );
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!("mock".parse::<LlmProvider>().unwrap(), LlmProvider::Mock);
        assert!("unknown".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(format!("{}", LlmProvider::OpenAi), "openai");
        assert_eq!(format!("{}", LlmProvider::Mock), "mock");
    }

    #[tokio::test]
    async fn test_mock_client_implements_trait() {
        let client: Box<dyn LlmClient> = Box::new(MockLlmClient::new());
        let messages = vec![Message::user("explain this error")];
        let response = client.complete(&messages).await.unwrap();
        assert!(!response.is_empty());
    }
}
