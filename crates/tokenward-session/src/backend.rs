//! The auth backend hook.
//!
//! tokenward doesn't talk to any server itself. Whatever performs the
//! HTTP calls (or gRPC, or a test double) implements [`AuthBackend`], and
//! the session controller calls it.
//!
//! Every method is async and fallible. The controller bounds each call with
//! the configured request timeout, so an implementation doesn't need its own.

use std::future::Future;
use std::sync::Arc;

use tokenward_protocol::{
    AuthGrant, Credentials, RegistrationData, TokenPair, UserProfile,
};

use crate::BackendError;

/// Network side of authentication.
///
/// # Trait bounds
///
/// - `Send + Sync` → the backend is shared between the caller's tasks and
///   the refresh timer task.
/// - `'static` → it lives as long as the session.
///
/// Returned futures must be `Send` because the refresh call runs inside a
/// spawned Tokio task.
///
/// # Example
///
/// ```rust
/// use tokenward_protocol::{
///     AuthGrant, Credentials, RegistrationData, TokenPair, UserProfile,
/// };
/// use tokenward_session::{AuthBackend, BackendError};
///
/// /// Rejects everything. Handy as a placeholder while wiring things up.
/// struct OfflineBackend;
///
/// impl AuthBackend for OfflineBackend {
///     async fn login(&self, _: &Credentials) -> Result<AuthGrant, BackendError> {
///         Err(BackendError::Network("offline".into()))
///     }
///     async fn register(&self, _: &RegistrationData) -> Result<AuthGrant, BackendError> {
///         Err(BackendError::Network("offline".into()))
///     }
///     async fn logout(&self) -> Result<(), BackendError> {
///         Ok(())
///     }
///     async fn current_user(&self) -> Result<UserProfile, BackendError> {
///         Err(BackendError::Unauthorized)
///     }
///     async fn refresh_token(&self) -> Result<TokenPair, BackendError> {
///         Err(BackendError::Unauthorized)
///     }
/// }
/// ```
pub trait AuthBackend: Send + Sync + 'static {
    /// Exchange credentials for a profile and a token pair.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthGrant, BackendError>> + Send;

    /// Create an account and sign it in.
    fn register(
        &self,
        data: &RegistrationData,
    ) -> impl Future<Output = Result<AuthGrant, BackendError>> + Send;

    /// Invalidate the session server-side. Best-effort: the controller
    /// signs out locally whatever this returns.
    fn logout(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Fetch the profile belonging to the currently stored token.
    fn current_user(
        &self,
    ) -> impl Future<Output = Result<UserProfile, BackendError>> + Send;

    /// Trade the stored refresh token for a new pair.
    fn refresh_token(
        &self,
    ) -> impl Future<Output = Result<TokenPair, BackendError>> + Send;
}

/// Sharing a backend between a session and the rest of the application
/// (or a test that wants to inspect it afterwards).
impl<T: AuthBackend> AuthBackend for Arc<T> {
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthGrant, BackendError>> + Send {
        (**self).login(credentials)
    }

    fn register(
        &self,
        data: &RegistrationData,
    ) -> impl Future<Output = Result<AuthGrant, BackendError>> + Send {
        (**self).register(data)
    }

    fn logout(&self) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).logout()
    }

    fn current_user(
        &self,
    ) -> impl Future<Output = Result<UserProfile, BackendError>> + Send {
        (**self).current_user()
    }

    fn refresh_token(
        &self,
    ) -> impl Future<Output = Result<TokenPair, BackendError>> + Send {
        (**self).refresh_token()
    }
}
