//! Error types for configuration validation.

use std::time::Duration;

/// A configuration value fell outside its accepted range.
///
/// Returned by the strict `try_validate` checks. The lenient `validated`
/// path clamps instead and never produces this.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} = {value:?} is outside {min:?}..={max:?}")]
    OutOfRange {
        field: &'static str,
        value: Duration,
        min: Duration,
        max: Duration,
    },
}
