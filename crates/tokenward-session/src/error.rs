//! Error types for the session layer.

use std::fmt;
use std::time::Duration;

/// Errors an [`AuthBackend`](crate::AuthBackend) call can fail with.
///
/// The controller never shows these to the user. They end up in log lines
/// and decide nothing except "the call failed".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend rejected the credentials or token (HTTP 401 and friends).
    #[error("unauthorized")]
    Unauthorized,

    /// No response within the configured request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request never reached the backend, or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a server-side failure.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The backend refused the request for a domain reason
    /// (e.g. username already taken).
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Errors from misusing the session controller itself.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// `initialize` was called more than once.
    #[error("session already initialized")]
    AlreadyInitialized,
}

/// Which failure path a backend error took. Used as a structured logging
/// field so every swallowed error can still be found in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Login or registration was rejected. The only user-visible kind.
    AuthenticationFailure,
    /// The startup profile fetch failed, so the stored session is stale.
    StaleSession,
    /// A scheduled refresh failed, so the session ended.
    SessionExpiry,
    /// The backend logout call failed. Local teardown went ahead anyway.
    BackendLogoutFailure,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationFailure => write!(f, "authentication_failure"),
            Self::StaleSession => write!(f, "stale_session"),
            Self::SessionExpiry => write!(f, "session_expiry"),
            Self::BackendLogoutFailure => write!(f, "backend_logout_failure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Server {
            status: 503,
            message: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "server error 503: maintenance");
    }

    #[test]
    fn test_timeout_display_includes_duration() {
        let err = BackendError::Timeout(Duration::from_secs(30));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_session_error_display() {
        assert_eq!(
            SessionError::AlreadyInitialized.to_string(),
            "session already initialized"
        );
    }

    #[test]
    fn test_failure_kind_display_is_snake_case() {
        assert_eq!(FailureKind::StaleSession.to_string(), "stale_session");
        assert_eq!(
            FailureKind::BackendLogoutFailure.to_string(),
            "backend_logout_failure"
        );
    }
}
