//! End-to-end tests for the `Session` facade against an in-memory accounts
//! backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokenward::prelude::*;
use tokenward::{LOGIN_FAILED_MESSAGE, RefreshConfig, SchedulerState};

// =========================================================================
// Accounts backend
// =========================================================================

/// Backend holding a password table. Issued tokens live `ttl_secs`.
struct Accounts {
    passwords: Mutex<HashMap<String, String>>,
    signed_in: Mutex<Option<UserProfile>>,
    ttl_secs: u64,
    issued: AtomicU64,
    refresh_fails: Mutex<bool>,
}

impl Accounts {
    fn new(ttl_secs: u64) -> Self {
        let mut passwords = HashMap::new();
        passwords.insert("ada".to_string(), "hunter2".to_string());
        Self {
            passwords: Mutex::new(passwords),
            signed_in: Mutex::new(None),
            ttl_secs,
            issued: AtomicU64::new(0),
            refresh_fails: Mutex::new(false),
        }
    }

    fn profile(username: &str) -> UserProfile {
        UserProfile {
            id: username.into(),
            display_name: username.to_string(),
            email: format!("{username}@example.com"),
            role: Default::default(),
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
        }
    }

    fn issue(&self) -> TokenPair {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        TokenPair {
            access_token: format!("access-{n}"),
            refresh_token: format!("refresh-{n}"),
            expires_in: self.ttl_secs,
        }
    }

    fn grant(&self, username: &str) -> AuthGrant {
        let user = Self::profile(username);
        *self.signed_in.lock().unwrap() = Some(user.clone());
        AuthGrant {
            user,
            tokens: self.issue(),
        }
    }
}

impl AuthBackend for Accounts {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, BackendError> {
        let known = self.passwords.lock().unwrap().get(&credentials.username).cloned();
        match known {
            Some(password) if password == credentials.password => {
                Ok(self.grant(&credentials.username))
            }
            _ => Err(BackendError::Unauthorized),
        }
    }

    async fn register(&self, data: &RegistrationData) -> Result<AuthGrant, BackendError> {
        let mut passwords = self.passwords.lock().unwrap();
        if passwords.contains_key(&data.username) {
            return Err(BackendError::Rejected("username taken".into()));
        }
        passwords.insert(data.username.clone(), data.password.clone());
        drop(passwords);
        Ok(self.grant(&data.username))
    }

    async fn logout(&self) -> Result<(), BackendError> {
        *self.signed_in.lock().unwrap() = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<UserProfile, BackendError> {
        self.signed_in
            .lock()
            .unwrap()
            .clone()
            .ok_or(BackendError::Unauthorized)
    }

    async fn refresh_token(&self) -> Result<TokenPair, BackendError> {
        if *self.refresh_fails.lock().unwrap() {
            return Err(BackendError::Unauthorized);
        }
        Ok(self.issue())
    }
}

// =========================================================================
// Fixtures
// =========================================================================

fn no_jitter(buffer_secs: u64) -> SessionConfig {
    SessionConfig {
        refresh: RefreshConfig::with_buffer(Duration::from_secs(buffer_secs)),
        ..SessionConfig::default()
    }
}

async fn start(
    accounts: Arc<Accounts>,
    store: Arc<MemoryTokenStore>,
) -> Session<Arc<Accounts>, Arc<MemoryTokenStore>> {
    Session::<Arc<Accounts>, Arc<MemoryTokenStore>>::builder()
        .config(no_jitter(300))
        .build(accounts, store)
        .await
        .unwrap()
}

// =========================================================================
// Builder
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_build_without_token_starts_signed_out() {
    let session = start(Arc::new(Accounts::new(3600)), Arc::new(MemoryTokenStore::new())).await;

    assert!(!session.is_authenticated());
    assert!(!session.is_loading());
    assert_eq!(session.user(), None);
    assert_eq!(session.error(), None);
}

#[tokio::test(start_paused = true)]
async fn test_build_with_stored_token_restores_user() {
    let accounts = Arc::new(Accounts::new(3600));
    let grant = accounts.grant("ada");
    let store = Arc::new(MemoryTokenStore::with_tokens(grant.tokens));

    let session = start(Arc::clone(&accounts), store).await;

    assert!(session.is_authenticated());
    assert_eq!(session.user().map(|u| u.display_name), Some("ada".to_string()));
    assert_eq!(session.refresh_state().await, SchedulerState::Scheduled);
}

#[tokio::test(start_paused = true)]
async fn test_build_strict_rejects_out_of_range_buffer() {
    let result = Session::<Arc<Accounts>, MemoryTokenStore>::builder()
        .refresh_buffer(Duration::from_secs(2 * 3600))
        .strict()
        .build(Arc::new(Accounts::new(3600)), MemoryTokenStore::new())
        .await;

    assert!(matches!(result, Err(TokenwardError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn test_build_lenient_clamps_out_of_range_buffer() {
    let session = Session::<Arc<Accounts>, MemoryTokenStore>::builder()
        .refresh_buffer(Duration::from_secs(2 * 3600))
        .max_jitter(Duration::ZERO)
        .build(Arc::new(Accounts::new(3600)), MemoryTokenStore::new())
        .await
        .unwrap();

    assert!(!session.is_authenticated());
}

// =========================================================================
// Operations
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_login_then_logout_round_trip() {
    let store = Arc::new(MemoryTokenStore::new());
    let session = start(Arc::new(Accounts::new(3600)), Arc::clone(&store)).await;

    let outcome = session.login(&Credentials::new("ada", "hunter2")).await;
    assert_eq!(outcome, Outcome::Authenticated);
    assert!(session.is_authenticated());
    assert_eq!(store.access_token(), Some("access-0".to_string()));

    session.logout().await;
    assert!(!session.is_authenticated());
    assert_eq!(store.access_token(), None);
    assert_eq!(session.refresh_state().await, SchedulerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_login_wrong_password_sets_error_until_cleared() {
    let session = start(Arc::new(Accounts::new(3600)), Arc::new(MemoryTokenStore::new())).await;

    let outcome = session.login(&Credentials::new("ada", "wrong")).await;
    assert_eq!(outcome, Outcome::Unauthenticated);
    assert_eq!(session.error().as_deref(), Some(LOGIN_FAILED_MESSAGE));

    session.clear_error().await;
    assert_eq!(session.error(), None);
    assert!(!session.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn test_register_new_user_signs_in() {
    let session = start(Arc::new(Accounts::new(3600)), Arc::new(MemoryTokenStore::new())).await;

    let outcome = session
        .register(&RegistrationData {
            username: "grace".into(),
            email: "grace@example.com".into(),
            password: "cobol".into(),
            display_name: None,
        })
        .await;

    assert_eq!(outcome, Outcome::Authenticated);
    assert_eq!(session.user().map(|u| u.email), Some("grace@example.com".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_keeps_session_alive_past_first_expiry() {
    let store = Arc::new(MemoryTokenStore::new());
    let session = start(Arc::new(Accounts::new(600)), Arc::clone(&store)).await;
    session.login(&Credentials::new("ada", "hunter2")).await;

    // First refresh at 300 s, second at 600 s; the original pair would
    // have expired at 600 s.
    tokio::time::sleep(Duration::from_secs(700)).await;

    assert!(session.is_authenticated());
    assert_eq!(store.access_token(), Some("access-2".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_default_config_refreshes_exactly_buffer_before_expiry() {
    let accounts = Arc::new(Accounts::new(600));
    let session = Session::<Arc<Accounts>, MemoryTokenStore>::builder()
        .build(Arc::clone(&accounts), MemoryTokenStore::new())
        .await
        .unwrap();
    session.login(&Credentials::new("ada", "hunter2")).await;

    tokio::time::sleep(Duration::from_millis(299_999)).await;
    assert_eq!(accounts.issued.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(accounts.issued.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_signs_out_silently() {
    let accounts = Arc::new(Accounts::new(600));
    let store = Arc::new(MemoryTokenStore::new());
    let session = start(Arc::clone(&accounts), Arc::clone(&store)).await;
    session.login(&Credentials::new("ada", "hunter2")).await;

    *accounts.refresh_fails.lock().unwrap() = true;
    tokio::time::sleep(Duration::from_secs(301)).await;

    assert!(!session.is_authenticated());
    assert_eq!(session.error(), None);
    assert_eq!(store.refresh_token(), None);
    assert_eq!(session.refresh_state().await, SchedulerState::Terminated);
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_sees_login() {
    let session = start(Arc::new(Accounts::new(3600)), Arc::new(MemoryTokenStore::new())).await;
    let mut rx = session.subscribe();

    let observer = tokio::spawn(async move {
        rx.wait_for(|state| state.is_authenticated()).await.map(|s| s.clone())
    });
    session.login(&Credentials::new("ada", "hunter2")).await;

    let seen = observer.await.unwrap().unwrap();
    assert_eq!(seen.user().map(|u| u.id.0.clone()), Some("ada".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_serializes_for_ui() {
    let session = start(Arc::new(Accounts::new(3600)), Arc::new(MemoryTokenStore::new())).await;
    session.login(&Credentials::new("ada", "hunter2")).await;

    let json = serde_json::to_value(session.snapshot()).unwrap();
    assert_eq!(json["status"], "authenticated");
    assert_eq!(json["user"]["display_name"], "ada");
    assert_eq!(json["loading"], false);
    assert!(json["error"].is_null());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_keeps_tokens_for_next_start() {
    let accounts = Arc::new(Accounts::new(3600));
    let store = Arc::new(MemoryTokenStore::new());
    let session = start(Arc::clone(&accounts), Arc::clone(&store)).await;
    session.login(&Credentials::new("ada", "hunter2")).await;

    session.shutdown().await;
    assert!(!session.is_authenticated());
    drop(session);

    let restarted = start(accounts, store).await;
    assert!(restarted.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn test_clones_share_one_session() {
    let session = start(Arc::new(Accounts::new(3600)), Arc::new(MemoryTokenStore::new())).await;
    let other = session.clone();

    other.login(&Credentials::new("ada", "hunter2")).await;

    assert!(session.is_authenticated());
}
