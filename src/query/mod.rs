//! Query execution layer.

mod executor;

pub use executor::QueryExecutor;
