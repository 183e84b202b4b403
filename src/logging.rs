//! Logging configuration for querywarden.

use tracing_subscriber::EnvFilter;

/// Initializes logging to stderr.
///
/// Stdout is reserved for query results and exports, so all diagnostics go
/// to stderr. The filter is taken from `RUST_LOG` when set.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
