//! Logging setup.

use tracing_subscriber::EnvFilter;

use crate::TokenwardError;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"info"` or `"tokenward=debug"`) when the
/// variable is unset or invalid.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> Result<(), TokenwardError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| TokenwardError::Tracing(e.to_string()))
}
