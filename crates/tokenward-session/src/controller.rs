//! The session controller: the only writer of session state.
//!
//! It's responsible for:
//! - Deciding at startup whether a stored token still means a signed-in user
//! - Running login/register/logout against the backend
//! - Keeping exactly one refresh timer armed while authenticated
//! - Publishing every state change to subscribers
//!
//! # Concurrency note
//!
//! All mutable state sits behind one `tokio::sync::Mutex`, and the lock is
//! never held across a backend call. Operations therefore interleave only
//! at `.await` points, the same way callbacks interleave on an event loop.
//!
//! Interleaving still means a slow login can finish after a newer one. Each
//! operation snapshots an epoch counter before its backend call and applies
//! its result only if the epoch is unchanged afterwards. Login, register,
//! logout, forced logout and shutdown all bump the epoch.

use std::future::Future;
use std::sync::Arc;

use tokenward_protocol::{AuthGrant, Credentials, RegistrationData};
use tokenward_refresh::{RefreshScheduler, SchedulerState};
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::time;

use crate::session::AuthAction;
use crate::{
    AuthBackend, BackendError, FailureKind, Outcome, SessionConfig,
    SessionError, SessionState, TokenStore,
};

/// Orchestrates the session lifecycle.
///
/// Cheap to clone: clones share the same session. The refresh timer holds
/// only a weak reference, so once every clone is dropped the session goes
/// away and a pending timer does nothing.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ initialize() ──→ login()/register() ──→ logout()
///               │                   │                   │
///               ▼                   ▼                   ▼
///   [Authenticated|Unauth]   [Authenticated]       [Unauthenticated]
///                                   │
///                    refresh timer ─┴─→ refresh ok → re-arm
///                                       refresh fail → [Unauthenticated]
/// ```
pub struct SessionController<B: AuthBackend, S: TokenStore> {
    inner: Arc<Inner<B, S>>,
}

impl<B: AuthBackend, S: TokenStore> Clone for SessionController<B, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<B, S> {
    backend: B,
    store: S,
    config: SessionConfig,
    core: Mutex<Core>,
    /// Latest published state. Readers borrow from here without taking
    /// the `core` lock.
    published: watch::Sender<SessionState>,
}

/// Everything the lock protects.
struct Core {
    state: SessionState,
    epoch: u64,
    initialized: bool,
    scheduler: RefreshScheduler,
}

impl<B: AuthBackend, S: TokenStore> SessionController<B, S> {
    /// Creates a controller in the `Initializing` state. Call
    /// [`initialize`](Self::initialize) next.
    pub fn new(backend: B, store: S, config: SessionConfig) -> Self {
        let config = config.validated();
        let state = SessionState::initializing();
        let (published, _) = watch::channel(state.clone());
        let core = Core {
            state,
            epoch: 0,
            initialized: false,
            scheduler: RefreshScheduler::new(config.refresh.clone()),
        };

        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                config,
                core: Mutex::new(core),
                published,
            }),
        }
    }

    /// Restores the session from the token store. Call once at startup.
    ///
    /// Without a valid stored token this makes no network call. With one,
    /// it fetches the profile; a failed fetch clears the tokens and signs
    /// out without setting an error.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyInitialized`] on a second call.
    pub async fn initialize(&self) -> Result<Outcome, SessionError> {
        let epoch = {
            let mut core = self.lock().await;
            if core.initialized {
                tracing::warn!("initialize called more than once");
                return Err(SessionError::AlreadyInitialized);
            }
            core.initialized = true;

            if core.epoch != 0 {
                // A login/register/logout already ran and owns the state.
                tracing::debug!(epoch = core.epoch, "initialize after first operation, skipping restore");
                return Ok(outcome_of(&core.state));
            }

            if !self.inner.store.has_valid_token() {
                tracing::info!("no valid stored token, starting signed out");
                self.set_state(&mut core, SessionState::unauthenticated());
                return Ok(Outcome::Unauthenticated);
            }
            core.epoch
        };

        tracing::debug!("stored token found, fetching profile");
        let result = self.call(self.inner.backend.current_user()).await;

        let mut core = self.lock().await;
        if core.epoch != epoch {
            tracing::debug!(epoch, current = core.epoch, "profile fetch superseded");
            return Ok(Outcome::Superseded);
        }

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "session restored");
                self.set_state(&mut core, SessionState::authenticated(user));
                self.arm_refresh(&mut core);
                Ok(Outcome::Authenticated)
            }
            Err(e) => {
                tracing::warn!(
                    kind = %FailureKind::StaleSession,
                    error = %e,
                    "stored session rejected, signing out"
                );
                self.inner.store.clear_tokens();
                self.set_state(&mut core, SessionState::unauthenticated());
                Ok(Outcome::Unauthenticated)
            }
        }
    }

    /// Signs in with username and password.
    ///
    /// On failure the state carries [`LOGIN_FAILED_MESSAGE`](crate::LOGIN_FAILED_MESSAGE);
    /// the backend's error is only logged.
    pub async fn login(&self, credentials: &Credentials) -> Outcome {
        self.authenticate(AuthAction::Login, self.inner.backend.login(credentials))
            .await
    }

    /// Creates an account and signs it in.
    ///
    /// On failure the state carries [`REGISTER_FAILED_MESSAGE`](crate::REGISTER_FAILED_MESSAGE).
    pub async fn register(&self, data: &RegistrationData) -> Outcome {
        self.authenticate(AuthAction::Register, self.inner.backend.register(data))
            .await
    }

    /// Signs out. Local teardown happens whatever the backend says.
    ///
    /// If a newer login/register starts while the backend logout is in
    /// flight, that newer operation owns the state and this call leaves it
    /// alone.
    pub async fn logout(&self) {
        let epoch = {
            let mut core = self.lock().await;
            core.epoch += 1;
            core.scheduler.cancel();
            core.state.begin_operation();
            self.publish(&core);
            core.epoch
        };

        if let Err(e) = self.call(self.inner.backend.logout()).await {
            tracing::warn!(
                kind = %FailureKind::BackendLogoutFailure,
                error = %e,
                "backend logout failed, signing out locally"
            );
        }

        let mut core = self.lock().await;
        if core.epoch != epoch {
            tracing::debug!(epoch, current = core.epoch, "logout superseded by newer operation");
            return;
        }
        self.teardown(&mut core);
        tracing::info!("signed out");
    }

    /// Clears the last login/register error. No other effect.
    pub async fn clear_error(&self) {
        let mut core = self.lock().await;
        if core.state.clear_error() {
            self.publish(&core);
        }
    }

    /// Application teardown: cancels the refresh timer, makes in-flight
    /// operations no-ops and resets to `Unauthenticated`.
    ///
    /// Unlike [`logout`](Self::logout) it neither calls the backend nor
    /// clears the stored tokens, so the next start can restore the session.
    pub async fn shutdown(&self) {
        let mut core = self.lock().await;
        core.epoch += 1;
        core.scheduler.cancel();
        self.set_state(&mut core, SessionState::unauthenticated());
        tracing::info!("session shut down");
    }

    /// The current state.
    pub fn snapshot(&self) -> SessionState {
        self.inner.published.borrow().clone()
    }

    /// A receiver that sees every published state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.published.subscribe()
    }

    /// The refresh scheduler's current state.
    pub async fn scheduler_state(&self) -> SchedulerState {
        self.lock().await.scheduler.state()
    }

    /// The config in use, after validation.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // -- Internals --------------------------------------------------------

    async fn authenticate<F>(&self, action: AuthAction, request: F) -> Outcome
    where
        F: Future<Output = Result<AuthGrant, BackendError>>,
    {
        let (epoch, was_authenticated) = {
            let mut core = self.lock().await;
            core.epoch += 1;
            // The old session's refresh must not outlive a new sign-in attempt.
            core.scheduler.cancel();
            core.state.begin_operation();
            self.publish(&core);
            (core.epoch, core.state.is_authenticated())
        };
        tracing::debug!(action = action.as_str(), epoch, "authentication started");

        let result = self.call(request).await;

        let mut core = self.lock().await;
        if core.epoch != epoch {
            tracing::debug!(
                action = action.as_str(),
                epoch,
                current = core.epoch,
                "result superseded by newer operation"
            );
            return Outcome::Superseded;
        }

        match result {
            Ok(grant) => {
                tracing::info!(action = action.as_str(), user_id = %grant.user.id, "authenticated");
                self.inner.store.set_tokens(grant.tokens);
                self.set_state(&mut core, SessionState::authenticated(grant.user));
                self.arm_refresh(&mut core);
                Outcome::Authenticated
            }
            Err(e) => {
                tracing::warn!(
                    kind = %FailureKind::AuthenticationFailure,
                    action = action.as_str(),
                    error = %e,
                    "authentication failed"
                );
                if was_authenticated {
                    // The previous user's session doesn't survive a failed
                    // sign-in as someone else.
                    self.inner.store.clear_tokens();
                }
                self.set_state(&mut core, SessionState::failed(action.failure_message()));
                Outcome::Unauthenticated
            }
        }
    }

    /// Cancel-then-create the refresh timer from the store's current expiry.
    fn arm_refresh(&self, core: &mut Core) {
        let weak = Arc::downgrade(&self.inner);
        let time_until_expiry = self.inner.store.time_until_expiry();
        core.scheduler.arm(time_until_expiry, move |generation| async move {
            if let Some(inner) = weak.upgrade() {
                SessionController { inner }.on_refresh_due(generation).await;
            }
        });
    }

    async fn on_refresh_due(&self, generation: u64) {
        let epoch = {
            let mut core = self.lock().await;
            if !core.scheduler.begin_firing(generation) {
                return;
            }
            core.epoch
        };
        tracing::debug!(generation, "refreshing access token");

        let result = self.call(self.inner.backend.refresh_token()).await;

        let mut core = self.lock().await;
        if core.epoch != epoch || !core.scheduler.is_current(generation) {
            tracing::debug!(generation, "refresh result discarded");
            return;
        }

        match result {
            Ok(tokens) => {
                self.inner.store.set_tokens(tokens);
                self.arm_refresh(&mut core);
                tracing::info!("access token refreshed");
            }
            Err(e) => {
                tracing::warn!(
                    kind = %FailureKind::SessionExpiry,
                    error = %e,
                    "token refresh failed, signing out"
                );
                core.epoch += 1;
                self.inner.store.clear_tokens();
                core.scheduler.terminate();
                self.set_state(&mut core, SessionState::unauthenticated());
            }
        }
    }

    /// The unconditional local half of logout.
    fn teardown(&self, core: &mut Core) {
        self.inner.store.clear_tokens();
        core.scheduler.cancel();
        self.set_state(core, SessionState::unauthenticated());
    }

    /// Runs a backend call under the configured timeout.
    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        let limit = self.inner.config.request_timeout;
        match time::timeout(limit, request).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(limit)),
        }
    }

    fn set_state(&self, core: &mut Core, state: SessionState) {
        core.state = state;
        self.publish(core);
    }

    fn publish(&self, core: &Core) {
        self.inner.published.send_replace(core.state.clone());
    }

    async fn lock(&self) -> MutexGuard<'_, Core> {
        self.inner.core.lock().await
    }
}

fn outcome_of(state: &SessionState) -> Outcome {
    if state.is_authenticated() {
        Outcome::Authenticated
    } else {
        Outcome::Unauthenticated
    }
}
