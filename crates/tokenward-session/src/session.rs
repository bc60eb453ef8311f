//! Session types: what the controller publishes and how it's configured.
//!
//! A session is the in-memory record of:
//! - WHETHER the caller is signed in (`AuthStatus`)
//! - WHO they are (the `UserProfile` inside `Authenticated`)
//! - WHAT went wrong with the last login/register, if anything (`error`)
//! - WHETHER an operation is in flight (`loading`)

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokenward_protocol::UserProfile;
use tokenward_refresh::{ConfigError, RefreshConfig};
use tracing::warn;

/// Message shown after a failed login.
pub const LOGIN_FAILED_MESSAGE: &str = "登录失败，请重试";

/// Message shown after a failed registration.
pub const REGISTER_FAILED_MESSAGE: &str = "注册失败，请重试";

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for a session controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Refresh scheduling (buffer before expiry, jitter).
    pub refresh: RefreshConfig,

    /// Upper bound on every backend call. A call that takes longer counts
    /// as failed.
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh: RefreshConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SessionConfig {
    pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
    pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(5 * 60);

    /// Clamp out-of-range values, logging each adjustment.
    pub fn validated(mut self) -> Self {
        let clamped = self
            .request_timeout
            .clamp(Self::MIN_REQUEST_TIMEOUT, Self::MAX_REQUEST_TIMEOUT);
        if clamped != self.request_timeout {
            warn!(
                timeout_ms = self.request_timeout.as_millis() as u64,
                clamped_ms = clamped.as_millis() as u64,
                "request_timeout out of range, clamping"
            );
            self.request_timeout = clamped;
        }
        self.refresh = self.refresh.validated();
        self
    }

    /// Reject out-of-range values instead of clamping them.
    pub fn try_validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout < Self::MIN_REQUEST_TIMEOUT
            || self.request_timeout > Self::MAX_REQUEST_TIMEOUT
        {
            return Err(ConfigError::OutOfRange {
                field: "request_timeout",
                value: self.request_timeout,
                min: Self::MIN_REQUEST_TIMEOUT,
                max: Self::MAX_REQUEST_TIMEOUT,
            });
        }
        self.refresh.try_validate()
    }
}

// ---------------------------------------------------------------------------
// AuthStatus
// ---------------------------------------------------------------------------

/// Whether the caller is signed in.
///
/// ```text
///   Initializing ──(no token / stale token)──→ Unauthenticated
///        │                                        ↑      │
///        └──(profile fetched)──→ Authenticated ───┘      │
///                                      ↑  (logout,       │
///                                      │   refresh fail) │
///                                      └────(login)──────┘
/// ```
///
/// The profile lives inside `Authenticated`, so "has a user" and "is
/// authenticated" can't disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "user", rename_all = "snake_case")]
pub enum AuthStatus {
    /// Startup hasn't decided yet.
    Initializing,
    Authenticated(UserProfile),
    Unauthenticated,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// A snapshot of the session, as published to readers.
///
/// Only the controller builds these. Readers get clones through
/// `SessionController::snapshot` or a `watch` subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    #[serde(flatten)]
    status: AuthStatus,
    error: Option<String>,
    loading: bool,
}

impl SessionState {
    pub(crate) fn initializing() -> Self {
        Self {
            status: AuthStatus::Initializing,
            error: None,
            loading: true,
        }
    }

    pub(crate) fn unauthenticated() -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            error: None,
            loading: false,
        }
    }

    pub(crate) fn authenticated(user: UserProfile) -> Self {
        Self {
            status: AuthStatus::Authenticated(user),
            error: None,
            loading: false,
        }
    }

    pub(crate) fn failed(message: &str) -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            error: Some(message.to_string()),
            loading: false,
        }
    }

    /// Start of a login/register/logout: keep the status, drop the error.
    pub(crate) fn begin_operation(&mut self) {
        self.error = None;
        self.loading = true;
    }

    /// Returns `true` if there was an error to clear.
    pub(crate) fn clear_error(&mut self) -> bool {
        self.error.take().is_some()
    }

    pub fn status(&self) -> &AuthStatus {
        &self.status
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.status, AuthStatus::Authenticated(_))
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&UserProfile> {
        match &self.status {
            AuthStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// The message from the last failed login/register.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `true` during startup and while an operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading || matches!(self.status, AuthStatus::Initializing)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How an operation ended, from the caller's point of view.
///
/// Failures don't appear here as errors: a rejected login is
/// `Unauthenticated` with the message in [`SessionState::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Authenticated,
    Unauthenticated,
    /// A newer login/register/logout started before this one finished, so
    /// its result was thrown away.
    Superseded,
}

/// Which user action a login-shaped call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthAction {
    Login,
    Register,
}

impl AuthAction {
    pub(crate) fn failure_message(self) -> &'static str {
        match self {
            Self::Login => LOGIN_FAILED_MESSAGE,
            Self::Register => REGISTER_FAILED_MESSAGE,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
        }
    }
}
