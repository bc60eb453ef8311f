//! Token persistence hook and an in-memory implementation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokenward_protocol::TokenPair;
use tokenward_refresh::deadline_after;
use tokio::time::Instant;

/// Where the current token pair lives.
///
/// The session controller never reads tokens. It only asks whether a valid
/// one exists and how long it has left, and hands new pairs over after a
/// login or refresh. All methods are synchronous: a store is expected to
/// answer from memory (a file- or keychain-backed store can keep a cached
/// copy).
pub trait TokenStore: Send + Sync + 'static {
    /// Whether an unexpired access token is stored.
    fn has_valid_token(&self) -> bool;

    /// Time left before the stored access token expires.
    /// `Duration::ZERO` when nothing is stored or it already expired.
    fn time_until_expiry(&self) -> Duration;

    /// Replace the stored pair.
    fn set_tokens(&self, tokens: TokenPair);

    /// Forget the stored pair. Idempotent.
    fn clear_tokens(&self);
}

impl<T: TokenStore> TokenStore for Arc<T> {
    fn has_valid_token(&self) -> bool {
        (**self).has_valid_token()
    }

    fn time_until_expiry(&self) -> Duration {
        (**self).time_until_expiry()
    }

    fn set_tokens(&self, tokens: TokenPair) {
        (**self).set_tokens(tokens);
    }

    fn clear_tokens(&self) {
        (**self).clear_tokens();
    }
}

// ---------------------------------------------------------------------------
// MemoryTokenStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct StoredTokens {
    pair: TokenPair,
    expires_at: Instant,
}

/// A [`TokenStore`] that keeps the pair in process memory.
///
/// Expiry is measured on Tokio's clock from the moment `set_tokens` was
/// called, so paused-time tests see tokens age as time is advanced.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Option<StoredTokens>>,
}

impl MemoryTokenStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `tokens`, issued just now.
    pub fn with_tokens(tokens: TokenPair) -> Self {
        let store = Self::new();
        store.set_tokens(tokens);
        store
    }

    /// The current access token, if one is stored and not yet expired.
    ///
    /// Backends use this to authorize their requests.
    pub fn access_token(&self) -> Option<String> {
        self.with_valid(|stored| stored.pair.access_token.clone())
    }

    /// The current refresh token, if one is stored. Returned even after the
    /// access token expired, since that is exactly when it's needed.
    pub fn refresh_token(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .map(|stored| stored.pair.refresh_token.clone())
    }

    fn with_valid<R>(&self, f: impl FnOnce(&StoredTokens) -> R) -> Option<R> {
        let guard = self.lock();
        guard
            .as_ref()
            .filter(|stored| stored.expires_at > Instant::now())
            .map(f)
    }

    // A panic while holding the lock can't leave a half-written pair behind
    // (every write is a single assignment), so a poisoned lock is still safe
    // to use.
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<StoredTokens>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn has_valid_token(&self) -> bool {
        self.with_valid(|_| ()).is_some()
    }

    fn time_until_expiry(&self) -> Duration {
        self.with_valid(|stored| {
            stored.expires_at.saturating_duration_since(Instant::now())
        })
        .unwrap_or(Duration::ZERO)
    }

    fn set_tokens(&self, tokens: TokenPair) {
        let expires_at = deadline_after(Duration::from_secs(tokens.expires_in));
        tracing::debug!(expires_in = tokens.expires_in, "tokens stored");
        *self.lock() = Some(StoredTokens {
            pair: tokens,
            expires_at,
        });
    }

    fn clear_tokens(&self) {
        if self.lock().take().is_some() {
            tracing::debug!("tokens cleared");
        }
    }
}
