use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokenward::prelude::*;

// ---------------------------------------------------------------------------
// Demo backend
// ---------------------------------------------------------------------------

/// Token lifetime handed out by the demo backend. Short so the refresh
/// timer visibly fires while the demo runs.
const TOKEN_TTL_SECS: u64 = 8;

/// A single hard-coded account, served from memory.
struct DemoBackend {
    signed_in: Mutex<Option<UserProfile>>,
    issued: AtomicU64,
}

impl DemoBackend {
    fn new() -> Self {
        Self {
            signed_in: Mutex::new(None),
            issued: AtomicU64::new(0),
        }
    }

    fn issue(&self) -> TokenPair {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        tracing::info!(n, "issuing token pair");
        TokenPair {
            access_token: format!("demo-access-{n}"),
            refresh_token: format!("demo-refresh-{n}"),
            expires_in: TOKEN_TTL_SECS,
        }
    }

    fn lock_user(&self) -> std::sync::MutexGuard<'_, Option<UserProfile>> {
        self.signed_in
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl AuthBackend for DemoBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, BackendError> {
        if credentials.username != "demo" || credentials.password != "demo" {
            return Err(BackendError::Unauthorized);
        }
        let user = UserProfile {
            id: "demo".into(),
            display_name: "Demo User".into(),
            email: "demo@example.com".into(),
            role: Default::default(),
            created_at: 0,
            updated_at: 0,
        };
        *self.lock_user() = Some(user.clone());
        Ok(AuthGrant {
            user,
            tokens: self.issue(),
        })
    }

    async fn register(&self, _data: &RegistrationData) -> Result<AuthGrant, BackendError> {
        Err(BackendError::Rejected("registration is closed".into()))
    }

    async fn logout(&self) -> Result<(), BackendError> {
        *self.lock_user() = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<UserProfile, BackendError> {
        self.lock_user().clone().ok_or(BackendError::Unauthorized)
    }

    async fn refresh_token(&self) -> Result<TokenPair, BackendError> {
        Ok(self.issue())
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn print_state(label: &str, state: &SessionState) {
    match serde_json::to_string(state) {
        Ok(json) => println!("{label:>16}: {json}"),
        Err(e) => eprintln!("{label:>16}: <unserializable: {e}>"),
    }
}

async fn run(
    backend: Arc<DemoBackend>,
    store: Arc<MemoryTokenStore>,
) -> Result<(), TokenwardError> {
    let session = Session::<Arc<DemoBackend>, Arc<MemoryTokenStore>>::builder()
        .refresh_buffer(Duration::from_secs(5))
        .max_jitter(Duration::ZERO)
        .build(backend, Arc::clone(&store))
        .await?;
    print_state("startup", &session.snapshot());

    session.login(&Credentials::new("demo", "wrong")).await;
    print_state("bad password", &session.snapshot());
    session.clear_error().await;

    session.login(&Credentials::new("demo", "demo")).await;
    print_state("signed in", &session.snapshot());

    // Refresh fires 5 s before each 8 s token expires.
    tokio::time::sleep(Duration::from_secs(7)).await;
    println!("{:>16}: {:?}", "access token", store.access_token());

    session.logout().await;
    print_state("signed out", &session.snapshot());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tokenward::init_tracing("info")?;
    run(Arc::new(DemoBackend::new()), Arc::new(MemoryTokenStore::new())).await?;
    Ok(())
}
