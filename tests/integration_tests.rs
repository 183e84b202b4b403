//! End-to-end tests over the mock database and mock LLM.
//!
//! Each test wires the dispatchers the way the binary does, with the MySQL
//! backend swapped for the in-memory mock. Nothing here needs a server.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use querywarden::agent::{AgentDispatcher, DirectDispatcher, ResponseMode};
use querywarden::db::{MockDatabaseClient, TabularResult, Value};
use querywarden::history::ResultHistory;
use querywarden::llm::{LlmResponse, MockLlmClient, ToolCall};
use querywarden::query::QueryExecutor;
use querywarden::safety::{self, QueryClass, ValidationOutcome};

fn users_table(row_count: usize) -> TabularResult {
    let rows = (0..row_count)
        .map(|i| {
            vec![
                Value::Int(i as i64),
                Value::String(format!("user_{i}")),
            ]
        })
        .collect();
    TabularResult::new(vec!["id".to_string(), "name".to_string()], rows)
}

fn executor_with_users(row_count: usize) -> Arc<QueryExecutor> {
    let db = MockDatabaseClient::new().with_table("users", users_table(row_count));
    Arc::new(QueryExecutor::new(Box::new(db)))
}

fn read_call(query: &str) -> ToolCall {
    ToolCall {
        id: "call_1".to_string(),
        name: "execute_read_query".to_string(),
        arguments: serde_json::json!({ "query": query }).to_string(),
    }
}

#[test]
fn classify_is_total_and_case_insensitive() {
    let cases = [
        ("SELECT * FROM users", QueryClass::Read),
        ("select id from users", QueryClass::Read),
        ("  \n SeLeCt 1", QueryClass::Read),
        ("INSERT INTO users VALUES (1)", QueryClass::Write),
        ("update users set name = 'x'", QueryClass::Write),
        ("DELETE FROM users", QueryClass::Write),
        ("create table t (id int)", QueryClass::Write),
        ("DROP TABLE users", QueryClass::Write),
        ("GRANT ALL ON users TO nobody", QueryClass::Unknown),
        ("", QueryClass::Unknown),
        ("   ", QueryClass::Unknown),
        ("EXPLAIN SELECT 1", QueryClass::Unknown),
    ];
    for (query, expected) in cases {
        assert_eq!(safety::classify(query), expected, "query: {query:?}");
        // Deterministic: a second call agrees with the first.
        assert_eq!(safety::classify(query), expected);
    }
}

#[test]
fn validate_rejects_chained_statements_and_accepts_bare_select() {
    assert!(!safety::validate("SELECT * FROM users; DROP TABLE users", QueryClass::Read).is_valid());
    assert!(!safety::validate("SELECT 1; SELECT 2", QueryClass::Read).is_valid());
    assert!(!safety::validate("SELECT 1 -- comment", QueryClass::Read).is_valid());
    assert!(!safety::validate("SELECT /* hidden */ 1", QueryClass::Read).is_valid());

    assert!(safety::validate("SELECT * FROM users", QueryClass::Read).is_valid());
    // A single trailing semicolon with nothing after it is still one statement.
    assert!(safety::validate("SELECT * FROM users;", QueryClass::Read).is_valid());

    match safety::validate("DROP TABLE users", QueryClass::Read) {
        ValidationOutcome::Invalid(_) => {}
        ValidationOutcome::Valid => panic!("write statement accepted as a read"),
    }
}

#[test]
fn history_eviction_keeps_the_newest_records() {
    let mut history = ResultHistory::new(20, 10);
    for i in 1..=21 {
        history.record_read(format!("SELECT {i}"), TabularResult::default());
    }

    assert_eq!(history.len(), 11);
    assert_eq!(history.latest().unwrap().query, "SELECT 21");
    // The oldest surviving record is the 11th; the 1st is gone.
    assert_eq!(history.by_index(0).unwrap().query, "SELECT 11");
    assert!(history.by_index(11).is_none());
}

#[tokio::test]
async fn repeated_select_is_stable_without_intervening_writes() {
    let executor = executor_with_users(5);
    let first = executor.execute_read("SELECT * FROM users").await.unwrap();
    let second = executor.execute_read("SELECT * FROM users").await.unwrap();

    assert_eq!(first.columns, second.columns);
    assert_eq!(first.rows, second.rows);
}

#[tokio::test]
async fn failed_write_leaves_table_unchanged() {
    let db = MockDatabaseClient::new()
        .with_table("users", users_table(3))
        .with_failing_writes();
    let executor = Arc::new(QueryExecutor::new(Box::new(db)));

    let before = executor.execute_read("SELECT * FROM users").await.unwrap();
    assert!(executor
        .execute_write("INSERT INTO users (id) VALUES (99)")
        .await
        .is_err());
    let after = executor.execute_read("SELECT * FROM users").await.unwrap();

    assert_eq!(before.rows, after.rows);
}

#[tokio::test]
async fn agent_read_of_150_rows_is_capped_at_100_with_a_note() {
    let llm = MockLlmClient::new()
        .with_turn(LlmResponse::with_tool_calls(
            "",
            vec![read_call("SELECT * FROM users")],
        ))
        .with_turn(LlmResponse::text("Fetched the users table."));
    let dispatcher = AgentDispatcher::new(
        executor_with_users(150),
        Arc::new(Mutex::new(ResultHistory::default())),
        Box::new(llm),
    );

    let response = dispatcher.run("SELECT * FROM users").await;

    assert_eq!(response.mode, ResponseMode::Read);
    assert_eq!(response.tabular_output.unwrap().row_count(), 100);
    assert!(
        response.narrative.contains("150"),
        "narrative must state the full row count: {}",
        response.narrative
    );
}

#[tokio::test]
async fn injection_attempt_yields_error_and_leaves_table_intact() {
    let executor = executor_with_users(3);
    let llm = MockLlmClient::new()
        .with_response("DROP", "The input chained a DROP statement after the SELECT.");
    let history = Arc::new(Mutex::new(ResultHistory::default()));
    let dispatcher = DirectDispatcher::new(Arc::clone(&executor), history, Box::new(llm));

    let response = dispatcher.run("SELECT * FROM users; DROP TABLE users;").await;

    assert_eq!(response.mode, ResponseMode::Error);
    let explanation = response.error_explanation.expect("error must carry advice");
    assert!(!explanation.is_empty());

    // The users table survived.
    let after = executor.execute_read("SELECT * FROM users").await.unwrap();
    assert_eq!(after.row_count(), 3);
}

#[tokio::test]
async fn direct_and_agent_paths_share_one_history() {
    let executor = executor_with_users(2);
    let history = Arc::new(Mutex::new(ResultHistory::default()));

    let direct = DirectDispatcher::new(
        Arc::clone(&executor),
        Arc::clone(&history),
        Box::new(MockLlmClient::new()),
    );
    direct.run("SELECT * FROM users").await;

    let llm = MockLlmClient::new()
        .with_turn(LlmResponse::with_tool_calls(
            "",
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "execute_write_query".to_string(),
                arguments: serde_json::json!({ "query": "DELETE FROM users" }).to_string(),
            }],
        ))
        .with_turn(LlmResponse::text("Cleared the table."));
    let agent = AgentDispatcher::new(Arc::clone(&executor), Arc::clone(&history), Box::new(llm));
    let response = agent.run("delete every user").await;

    assert_eq!(response.mode, ResponseMode::Write);
    let history = history.lock().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.by_index(0).unwrap().class, QueryClass::Read);
    assert_eq!(history.latest().unwrap().class, QueryClass::Write);
}

#[tokio::test]
async fn exports_round_a_read_result_through_csv_and_json() {
    let executor = executor_with_users(2);
    let history = Arc::new(Mutex::new(ResultHistory::default()));
    let dispatcher = DirectDispatcher::new(executor, history, Box::new(MockLlmClient::new()));

    let response = dispatcher.run("SELECT * FROM users").await;
    let table = response.tabular_output.expect("read must carry a table");

    let csv = table.to_csv().unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("id,name"));
    assert_eq!(lines.next(), Some("0,user_0"));

    let json: serde_json::Value = serde_json::from_str(&table.to_json_records().unwrap()).unwrap();
    assert_eq!(json[1]["name"], "user_1");

    // Same round trip through a file, as --output does.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.csv");
    std::fs::write(&path, &csv).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), csv);
}
