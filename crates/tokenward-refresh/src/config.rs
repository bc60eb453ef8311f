//! Refresh scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ConfigError;

/// Default lead time before expiry at which a refresh fires: 5 minutes.
pub const REFRESH_BUFFER: Duration = Duration::from_millis(5 * 60 * 1000);

/// Configuration for the refresh scheduler.
///
/// `#[serde(default)]` lets a config file set only the fields it cares
/// about; everything else falls back to [`RefreshConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// How long before expiry the refresh should fire.
    ///
    /// A token with less than this left is refreshed on the next tick.
    pub refresh_buffer: Duration,

    /// Upper bound of the random amount subtracted from each delay.
    ///
    /// Many clients that signed in at the same moment would otherwise all
    /// refresh at the same moment too. Jitter only ever moves a refresh
    /// earlier, never past the buffer. Off (`Duration::ZERO`) unless set.
    pub max_jitter: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            refresh_buffer: REFRESH_BUFFER,
            max_jitter: Duration::ZERO,
        }
    }
}

impl RefreshConfig {
    /// Largest accepted refresh buffer.
    pub const MAX_REFRESH_BUFFER: Duration = Duration::from_secs(60 * 60);

    /// Config with the given buffer and no jitter.
    pub fn with_buffer(refresh_buffer: Duration) -> Self {
        Self {
            refresh_buffer,
            max_jitter: Duration::ZERO,
        }
    }

    /// Clamp any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`RefreshScheduler::new`](crate::RefreshScheduler::new).
    /// Rules:
    /// - `refresh_buffer` capped to [`Self::MAX_REFRESH_BUFFER`].
    /// - `max_jitter` capped to `refresh_buffer`.
    pub fn validated(mut self) -> Self {
        if self.refresh_buffer > Self::MAX_REFRESH_BUFFER {
            warn!(
                buffer_ms = self.refresh_buffer.as_millis() as u64,
                max_ms = Self::MAX_REFRESH_BUFFER.as_millis() as u64,
                "refresh_buffer exceeds maximum, clamping"
            );
            self.refresh_buffer = Self::MAX_REFRESH_BUFFER;
        }
        if self.max_jitter > self.refresh_buffer {
            warn!(
                jitter_ms = self.max_jitter.as_millis() as u64,
                buffer_ms = self.refresh_buffer.as_millis() as u64,
                "max_jitter exceeds refresh_buffer, clamping"
            );
            self.max_jitter = self.refresh_buffer;
        }
        self
    }

    /// Strict counterpart of [`validated`](Self::validated): reject instead
    /// of clamping.
    pub fn try_validate(&self) -> Result<(), ConfigError> {
        if self.refresh_buffer > Self::MAX_REFRESH_BUFFER {
            return Err(ConfigError::OutOfRange {
                field: "refresh_buffer",
                value: self.refresh_buffer,
                min: Duration::ZERO,
                max: Self::MAX_REFRESH_BUFFER,
            });
        }
        if self.max_jitter > self.refresh_buffer {
            return Err(ConfigError::OutOfRange {
                field: "max_jitter",
                value: self.max_jitter,
                min: Duration::ZERO,
                max: self.refresh_buffer,
            });
        }
        Ok(())
    }

    /// Delay before refreshing a token with `time_until_expiry` left,
    /// before jitter: `max(time_until_expiry - refresh_buffer, 0)`.
    pub fn base_delay(&self, time_until_expiry: Duration) -> Duration {
        time_until_expiry.saturating_sub(self.refresh_buffer)
    }
}
