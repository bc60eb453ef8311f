//! Proactive token refresh scheduling for tokenward.
//!
//! A [`RefreshScheduler`] holds at most one pending timer. Arming it
//! computes how long to wait from the time left on the current token,
//! minus a configurable [`RefreshConfig::refresh_buffer`] (5 minutes by
//! default), and spawns a one-shot Tokio task that runs a callback when the
//! wait is over.
//!
//! The scheduler doesn't perform the refresh itself. The session controller
//! passes a callback that calls the backend, then re-arms the scheduler on
//! success or [`terminate`](RefreshScheduler::terminate)s it on failure.
//!
//! # Integration
//!
//! ```ignore
//! let generation = scheduler.arm(store.time_until_expiry(), move |generation| async move {
//!     // lock the controller, check `begin_firing(generation)`,
//!     // call the backend, then `arm` again or `terminate`
//! });
//! ```
//!
//! Timers run on Tokio time, so tests can drive them with
//! `#[tokio::test(start_paused = true)]`.

mod config;
mod error;
mod scheduler;

pub use config::{REFRESH_BUFFER, RefreshConfig};
pub use error::ConfigError;
pub use scheduler::{
    MAX_DEADLINE, RefreshScheduler, RefreshTimerHandle, SchedulerState,
    deadline_after,
};
