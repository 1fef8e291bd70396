//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! repository test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixture model registry and seed rows matching the fixture schema
//! - `database`: PostgreSQL container management
//! - `assertions`: Assertion helpers for records and pages
//! - `generators`: Property-based generators for filter keys and order specs

pub mod fixtures;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;

/// Installs a test-friendly tracing subscriber once per process
///
/// Honors `RUST_LOG`, falling back to the configured `REPO_LOG_LEVEL`.
pub fn init_test_tracing() {
    let log_level = infra_db::RepositoryConfig::from_env()
        .map(|config| config.log_level)
        .unwrap_or_else(|_| "info".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
