//! querywarden - a guarded SQL access layer for LLM-driven database work.
//!
//! This library exposes the core modules for use in integration tests.

pub mod agent;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod llm;
pub mod logging;
pub mod query;
pub mod safety;
