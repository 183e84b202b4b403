//! Agent-facing dispatch layer.
//!
//! Exposes the two named query actions to the tool-calling loop, the bounded
//! loop itself, the advisory error explainer, and the two dispatchers that
//! shape every outcome into a uniform `DispatchResponse`.

mod advisor;
mod dispatch;
mod runner;
mod tools;

pub use advisor::ErrorAdvisor;
pub use dispatch::{AgentDispatcher, DirectDispatcher, DispatchResponse, ResponseMode};
pub use runner::{AgentRunner, MAX_AGENT_ITERATIONS};
pub use tools::{ToolAdapter, DEFAULT_MAX_ROWS_OUT};
