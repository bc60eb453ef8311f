//! Unified error type for tokenward.

use tokenward_refresh::ConfigError;
use tokenward_session::{BackendError, SessionError};

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tokenward` meta-crate you deal with this single error
/// type instead of importing errors from each sub-crate. `#[from]` lets `?`
/// convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TokenwardError {
    /// Controller misuse, such as a second `initialize`.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A config value failed strict validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A backend call failed. The session itself never returns these;
    /// the variant exists for backend implementations built on this crate.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The tracing subscriber couldn't be installed.
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),
}
