//! # tokenward
//!
//! Client-side session lifecycle with proactive token refresh.
//!
//! tokenward decides whether the user is signed in, holds their profile,
//! runs login/register/logout against your backend, and refreshes the
//! access token shortly before it expires. You implement [`AuthBackend`]
//! (the network calls) and optionally [`TokenStore`] (where tokens live;
//! [`MemoryTokenStore`] is provided), and the [`Session`] does the rest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tokenward::prelude::*;
//!
//! // Implement AuthBackend for your API client, then:
//! // let session = Session::builder()
//! //     .build(my_backend, MemoryTokenStore::new())
//! //     .await?;
//! // session.login(&Credentials::new("ada", "hunter2")).await;
//! // assert!(session.is_authenticated());
//! ```

mod error;
mod session;
mod telemetry;

pub use error::TokenwardError;
pub use session::{Session, SessionBuilder};
pub use telemetry::init_tracing;

pub use tokenward_protocol::{
    AuthGrant, Credentials, RegistrationData, Role, TokenPair, UserId,
    UserProfile,
};
pub use tokenward_refresh::{REFRESH_BUFFER, RefreshConfig, SchedulerState};
pub use tokenward_session::{
    AuthBackend, AuthStatus, BackendError, LOGIN_FAILED_MESSAGE,
    MemoryTokenStore, Outcome, REGISTER_FAILED_MESSAGE, SessionConfig,
    SessionError, SessionState, TokenStore,
};

pub mod prelude {
    //! Everything an application needs, in one import.

    pub use std::time::Duration;

    pub use crate::{
        AuthBackend, AuthGrant, AuthStatus, BackendError, Credentials,
        MemoryTokenStore, Outcome, RegistrationData, Session, SessionConfig,
        SessionState, TokenPair, TokenStore, TokenwardError, UserProfile,
    };
}
