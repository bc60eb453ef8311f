//! The refresh scheduler: owns at most one pending refresh timer.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use crate::RefreshConfig;

/// Furthest ahead a deadline is ever placed: 30 years. Token lifetimes come
/// from the backend unchecked, and `Instant` arithmetic panics on overflow.
pub const MAX_DEADLINE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// `now + delay`, with `delay` capped at [`MAX_DEADLINE`].
pub fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay.min(MAX_DEADLINE)).unwrap_or(now)
}

// ---------------------------------------------------------------------------
// SchedulerState
// ---------------------------------------------------------------------------

/// Where the scheduler is in its cycle.
///
/// ```text
///   Idle ──(arm)──→ Scheduled ──(timer fires)──→ Firing
///    ↑                  │                          │
///    └────(cancel)──────┘          ┌───────────────┴──────────────┐
///                                  ▼                              ▼
///                       Scheduled (re-armed)            Terminated (terminate)
/// ```
///
/// `Terminated` means the last refresh failed and the session was torn
/// down. Arming again (after a fresh login) is allowed from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Scheduled,
    Firing,
    Terminated,
}

// ---------------------------------------------------------------------------
// RefreshTimerHandle
// ---------------------------------------------------------------------------

/// A live one-shot refresh timer.
///
/// Wraps the Tokio task that sleeps until the deadline and then runs the
/// fire callback. Aborting the task before the deadline means the callback
/// never runs.
#[derive(Debug)]
pub struct RefreshTimerHandle {
    generation: u64,
    deadline: Instant,
    task: JoinHandle<()>,
}

impl RefreshTimerHandle {
    /// Generation number this timer was armed with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the timer fires.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    fn cancel(self) {
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// RefreshScheduler
// ---------------------------------------------------------------------------

/// Single-timer refresh scheduler.
///
/// One scheduler per session. The scheduler knows nothing about backends
/// or token stores: the caller passes in the time left on the current token
/// and a callback to run when the refresh is due. The session controller
/// supplies both.
///
/// # Generations
///
/// Every [`arm`](Self::arm) and [`cancel`](Self::cancel) bumps a generation
/// counter. A fire callback receives the generation it was armed with and
/// must check [`begin_firing`](Self::begin_firing) (and later
/// [`is_current`](Self::is_current)) before acting. A timer that was
/// superseded while its callback was already running therefore can't apply
/// a stale result.
pub struct RefreshScheduler {
    config: RefreshConfig,
    timer: Option<RefreshTimerHandle>,
    generation: u64,
    state: SchedulerState,
}

impl RefreshScheduler {
    /// Create an idle scheduler. The config is clamped via
    /// [`RefreshConfig::validated`].
    pub fn new(config: RefreshConfig) -> Self {
        let config = config.validated();
        debug!(
            buffer_ms = config.refresh_buffer.as_millis() as u64,
            jitter_ms = config.max_jitter.as_millis() as u64,
            "refresh scheduler created"
        );
        Self {
            config,
            timer: None,
            generation: 0,
            state: SchedulerState::Idle,
        }
    }

    /// The delay [`arm`](Self::arm) would use for this expiry, jitter
    /// included. Never exceeds [`RefreshConfig::base_delay`].
    pub fn refresh_delay(&self, time_until_expiry: Duration) -> Duration {
        let base = self.config.base_delay(time_until_expiry);
        let jitter_ms = self.config.max_jitter.as_millis() as u64;
        if jitter_ms == 0 || base.is_zero() {
            return base;
        }
        let jitter = rand::rng().random_range(0..=jitter_ms);
        base.saturating_sub(Duration::from_millis(jitter))
    }

    /// Cancel any pending timer and start a new one.
    ///
    /// After the computed delay, `on_fire` is called with the generation of
    /// this arming and the returned future is driven to completion on the
    /// Tokio runtime. Returns that generation.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn arm<F, Fut>(&mut self, time_until_expiry: Duration, on_fire: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.abort_timer();
        self.generation += 1;
        let generation = self.generation;

        let delay = self.refresh_delay(time_until_expiry);
        let deadline = deadline_after(delay);
        let task = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            trace!(generation, "refresh timer fired");
            on_fire(generation).await;
        });

        self.timer = Some(RefreshTimerHandle {
            generation,
            deadline,
            task,
        });
        self.state = SchedulerState::Scheduled;

        debug!(
            generation,
            delay_ms = delay.as_millis() as u64,
            expiry_ms = time_until_expiry.as_millis() as u64,
            "refresh scheduled"
        );
        generation
    }

    /// Called by a fire callback before it starts the refresh.
    ///
    /// Returns `true` and moves to [`SchedulerState::Firing`] if
    /// `generation` is still the armed one. The finished timer is released
    /// so a later `arm` doesn't abort the callback that is calling it.
    pub fn begin_firing(&mut self, generation: u64) -> bool {
        if self.state != SchedulerState::Scheduled || generation != self.generation {
            trace!(
                generation,
                current = self.generation,
                "stale refresh timer ignored"
            );
            return false;
        }
        // Dropping a JoinHandle detaches the task; it does not abort it.
        self.timer = None;
        self.state = SchedulerState::Firing;
        true
    }

    /// Whether `generation` is still the scheduler's latest arming.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Cancel any pending timer and return to [`SchedulerState::Idle`].
    ///
    /// Idempotent. Also invalidates a callback that is mid-refresh.
    pub fn cancel(&mut self) {
        let had_timer = self.abort_timer();
        self.generation += 1;
        self.state = SchedulerState::Idle;
        if had_timer {
            debug!(generation = self.generation, "refresh timer cancelled");
        }
    }

    /// Cancel and mark the scheduler as terminated after a failed refresh.
    pub fn terminate(&mut self) {
        self.abort_timer();
        self.generation += 1;
        self.state = SchedulerState::Terminated;
        debug!(generation = self.generation, "refresh scheduler terminated");
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Latest generation number.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a timer is pending.
    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Deadline of the pending timer, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.as_ref().map(RefreshTimerHandle::deadline)
    }

    /// The (validated) config in use.
    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    fn abort_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.abort_timer();
    }
}
