//! Error types for querywarden.
//!
//! Defines the main error enum used throughout the application.
//! Configuration and connection failures are fatal for the session;
//! validation, execution, LLM, and loop-bound failures are recoverable
//! and are shaped into Error-mode dispatch responses.

use thiserror::Error;

/// Main error type for querywarden operations.
#[derive(Error, Debug)]
pub enum WardenError {
    /// Configuration errors (missing credentials, malformed connection URL).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query validation failures (injection pattern or class mismatch).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Query execution errors (backend rejected the statement).
    #[error("Execution error: {0}")]
    Execution(String),

    /// LLM API errors (rate limits, auth, timeouts, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// The agent loop exceeded its iteration bound or produced no usable
    /// outcome.
    #[error("Agent loop error: {0}")]
    LoopBound(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a loop-bound error with the given message.
    pub fn loop_bound(msg: impl Into<String>) -> Self {
        Self::LoopBound(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::Validation(_) => "Validation Error",
            Self::Execution(_) => "Execution Error",
            Self::Llm(_) => "LLM Error",
            Self::LoopBound(_) => "Agent Loop Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if the error is recoverable at the dispatch layer.
    ///
    /// Recoverable errors are surfaced as Error-mode responses with advisory
    /// text; fatal errors require the caller to rebuild the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Execution(_) | Self::Llm(_) | Self::LoopBound(_)
        )
    }
}

/// Result type alias using WardenError.
pub type Result<T> = std::result::Result<T, WardenError>;
