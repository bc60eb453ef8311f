//! `Session` facade and its builder.
//!
//! This is the entry point for applications. It ties the layers together:
//! backend + token store → controller → refresh scheduler, and exposes a
//! read-only view plus the four user operations.

use std::time::Duration;

use tokenward_protocol::{Credentials, RegistrationData, UserProfile};
use tokenward_refresh::SchedulerState;
use tokenward_session::{
    AuthBackend, Outcome, SessionConfig, SessionController, SessionState,
    TokenStore,
};
use tokio::sync::watch;

use crate::TokenwardError;

/// Builder for configuring and starting a [`Session`].
///
/// # Example
///
/// ```rust,ignore
/// use tokenward::prelude::*;
///
/// let session = Session::builder()
///     .request_timeout(Duration::from_secs(10))
///     .build(my_backend, MemoryTokenStore::new())
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    config: SessionConfig,
    strict: bool,
}

impl SessionBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            strict: false,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets how long before expiry the token is refreshed.
    pub fn refresh_buffer(mut self, buffer: Duration) -> Self {
        self.config.refresh.refresh_buffer = buffer;
        self
    }

    /// Sets the upper bound of the random early-refresh jitter.
    pub fn max_jitter(mut self, jitter: Duration) -> Self {
        self.config.refresh.max_jitter = jitter;
        self
    }

    /// Sets the timeout applied to every backend call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Reject out-of-range config values instead of clamping them.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Builds the session and restores it from `store`.
    ///
    /// Returns once startup has settled: either a stored token was turned
    /// back into a signed-in user, or the session starts signed out.
    ///
    /// # Errors
    /// [`TokenwardError::Config`] if [`strict`](Self::strict) is set and the
    /// config is out of range.
    pub async fn build<B, S>(
        self,
        backend: B,
        store: S,
    ) -> Result<Session<B, S>, TokenwardError>
    where
        B: AuthBackend,
        S: TokenStore,
    {
        if self.strict {
            self.config.try_validate()?;
        }
        let controller = SessionController::new(backend, store, self.config);
        let outcome = controller.initialize().await?;
        tracing::debug!(?outcome, "session initialized");
        Ok(Session { controller })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running session: read-only view plus the user operations.
///
/// Cheap to clone; clones share one session. Dropping the last clone
/// cancels the refresh timer.
pub struct Session<B: AuthBackend, S: TokenStore> {
    controller: SessionController<B, S>,
}

impl<B: AuthBackend, S: TokenStore> Clone for Session<B, S> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
        }
    }
}

impl<B: AuthBackend, S: TokenStore> Session<B, S> {
    /// Creates a new builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    // -- Read --------------------------------------------------------------

    pub fn is_authenticated(&self) -> bool {
        self.controller.snapshot().is_authenticated()
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<UserProfile> {
        self.controller.snapshot().user().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.controller.snapshot().is_loading()
    }

    /// Message from the last failed login/register.
    pub fn error(&self) -> Option<String> {
        self.controller.snapshot().error().map(str::to_string)
    }

    /// The whole current state at once.
    pub fn snapshot(&self) -> SessionState {
        self.controller.snapshot()
    }

    /// Receives every state change. The receiver starts out with the
    /// current state marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.controller.subscribe()
    }

    /// Where the refresh timer is in its cycle.
    pub async fn refresh_state(&self) -> SchedulerState {
        self.controller.scheduler_state().await
    }

    // -- Operations ----------------------------------------------------------

    pub async fn login(&self, credentials: &Credentials) -> Outcome {
        self.controller.login(credentials).await
    }

    pub async fn register(&self, data: &RegistrationData) -> Outcome {
        self.controller.register(data).await
    }

    pub async fn logout(&self) {
        self.controller.logout().await;
    }

    pub async fn clear_error(&self) {
        self.controller.clear_error().await;
    }

    /// Tears the session down at application exit without signing out
    /// server-side.
    pub async fn shutdown(&self) {
        self.controller.shutdown().await;
    }
}
