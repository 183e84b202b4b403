//! querywarden - a guarded SQL access layer for LLM-driven database work.

use std::fs;
use std::sync::{Arc, Mutex};

use tracing::{error, info};

use querywarden::agent::{AgentDispatcher, DirectDispatcher, DispatchResponse, ResponseMode};
use querywarden::cli::{Cli, ExportFormat, Request};
use querywarden::config::ConnectionConfig;
use querywarden::db::{DatabaseClient, MockDatabaseClient, TabularResult, Value};
use querywarden::error::Result;
use querywarden::history::ResultHistory;
use querywarden::llm::{create_client, LlmProvider};
use querywarden::query::QueryExecutor;
use querywarden::{db, logging};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let request = cli.request()?;

    let database = build_database(&cli).await?;
    let executor = Arc::new(QueryExecutor::new(database));
    let history = Arc::new(Mutex::new(ResultHistory::default()));

    let provider = if cli.mock_llm {
        LlmProvider::Mock
    } else {
        LlmProvider::OpenAi
    };
    let llm = create_client(provider)?;
    info!(%provider, "LLM client ready");

    let response = match request {
        Request::Direct(sql) => {
            DirectDispatcher::new(Arc::clone(&executor), Arc::clone(&history), llm)
                .run(sql)
                .await
        }
        Request::Agent(text) => {
            AgentDispatcher::new(Arc::clone(&executor), Arc::clone(&history), llm)
                .with_max_rows_out(cli.max_rows)
                .run(text)
                .await
        }
    };

    render_response(&response);

    if let Some(format) = cli.export {
        export_response(&response, format, cli.output.as_deref())?;
    }

    executor.close().await?;

    if response.mode == ResponseMode::Error {
        std::process::exit(2);
    }
    Ok(())
}

/// Builds the database client, connecting to MySQL unless mocking.
async fn build_database(cli: &Cli) -> Result<Box<dyn DatabaseClient>> {
    if cli.mock_db {
        info!("Using mock database");
        return Ok(Box::new(demo_database()));
    }

    let config = match &cli.connection_string {
        Some(conn_str) => ConnectionConfig::from_connection_string(conn_str)?,
        None => ConnectionConfig::resolve(
            cli.user.clone(),
            cli.password.clone(),
            cli.host.clone(),
            cli.database.clone(),
        )?,
    };
    info!("Connecting to {}", config.display_string());
    db::connect(&config).await
}

/// A small in-memory dataset for trying the tool without a server.
fn demo_database() -> MockDatabaseClient {
    let users = TabularResult::new(
        vec!["id".to_string(), "name".to_string()],
        vec![
            vec![Value::Int(1), Value::String("alice".to_string())],
            vec![Value::Int(2), Value::String("bob".to_string())],
            vec![Value::Int(3), Value::Null],
        ],
    );
    MockDatabaseClient::new().with_table("users", users)
}

/// Prints a response to stdout.
fn render_response(response: &DispatchResponse) {
    if let Some(query) = &response.query {
        println!("Query: {query}");
    }
    println!("{}", response.narrative);

    if let Some(table) = &response.tabular_output {
        println!();
        print!("{}", format_table(table));
    }

    if let Some(explanation) = &response.error_explanation {
        println!();
        println!("{explanation}");
    }
}

/// Renders a result as an aligned text table.
fn format_table(table: &TabularResult) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(String::len).collect();
    let rendered_rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(Value::to_display_string).collect())
        .collect();
    for row in &rendered_rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() && cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let mut out = String::new();
    let header: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{:<width$}", name, width = widths[i]))
        .collect();
    out.push_str(&header.join("  "));
    out.push('\n');
    for row in &rendered_rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths.get(i).copied().unwrap_or(0)))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out.push_str(&format!("({} rows)\n", table.row_count()));
    out
}

/// Writes the response's tabular output in the requested format.
fn export_response(
    response: &DispatchResponse,
    format: ExportFormat,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let Some(table) = &response.tabular_output else {
        info!("Nothing to export, response carries no tabular output");
        return Ok(());
    };

    let rendered = match format {
        ExportFormat::Csv => table.to_csv()?,
        ExportFormat::Json => table.to_json_records()?,
    };

    match output {
        Some(path) => {
            fs::write(path, rendered).map_err(|e| {
                querywarden::error::WardenError::config(format!(
                    "Could not write export to {}: {e}",
                    path.display()
                ))
            })?;
            info!(path = %path.display(), "Export written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
