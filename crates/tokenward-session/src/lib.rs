//! Session lifecycle and token refresh for tokenward.
//!
//! This crate decides whether the caller is signed in and keeps them that
//! way:
//!
//! 1. **Startup** — restore a session from a stored token ([`TokenStore`])
//!    by fetching the profile from the [`AuthBackend`]
//! 2. **Transitions** — login, register and logout through the
//!    [`SessionController`], which is the only writer of [`SessionState`]
//! 3. **Refresh** — a single timer that refreshes the access token shortly
//!    before it expires, and signs out if that fails
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (tokenward)  ← read-only view + operations for the application
//!     ↕
//! Session layer (this crate)  ← state, transitions, epoch guard
//!     ↕
//! Refresh scheduler (tokenward-refresh)  ← one cancelable timer
//!     ↕
//! AuthBackend / TokenStore  ← supplied by the application
//! ```

mod backend;
mod controller;
mod error;
mod session;
mod store;

pub use backend::AuthBackend;
pub use controller::SessionController;
pub use error::{BackendError, FailureKind, SessionError};
pub use session::{
    AuthStatus, LOGIN_FAILED_MESSAGE, Outcome, REGISTER_FAILED_MESSAGE,
    SessionConfig, SessionState,
};
pub use store::{MemoryTokenStore, TokenStore};
