//! Prompt construction for LLM requests.
//!
//! Builds the agent's system prompt with the database schema summary
//! injected, plus the message list for a single natural-language request.

use crate::db::DatabaseInfo;
use crate::llm::types::Message;

/// System prompt template for the SQL agent.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are an SQL database management assistant with access to tools for executing queries on the database: a read tool for SELECT queries and a write tool for INSERT, UPDATE, DELETE, CREATE, and DROP statements. Interpret the user's input, generate the appropriate SQL query when necessary, and invoke the relevant tool to execute it.

- Read tool: after a read query executes, report the success message, explain the query, and answer the user's question if one was asked.
- Write tool: after a write query executes, report the tool's success or failure message and explain what the statement did.
- No tool: if no query is needed, answer the user's question directly without generating SQL.

Keep responses clear and concise. Use the following database information:

{db_info}"#;

/// Builds the agent system prompt with the schema summary injected.
pub fn build_system_prompt(info: &DatabaseInfo) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{db_info}", &info.format_for_prompt())
}

/// Builds the initial message list for one agent request.
pub fn build_agent_messages(info: &DatabaseInfo, user_input: &str) -> Vec<Message> {
    vec![
        Message::system(build_system_prompt(info)),
        Message::user(user_input),
    ]
}
