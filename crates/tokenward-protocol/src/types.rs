//! Payload types exchanged with an auth backend.
//!
//! These are the values that cross the boundary between the session core
//! and whatever performs the actual network calls. The session core treats
//! most of them as opaque: it only checks that a profile is *present*, and it
//! never looks inside a token pair — validity and expiry questions go to the
//! `TokenStore` instead.
//!
//! Everything derives `Serialize`/`Deserialize` so a backend implementation
//! can decode responses straight into these types.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user account.
///
/// Newtype wrapper so a user ID can't be confused with any other string
/// flowing through the session core (tokens, emails, display names).
///
/// `#[serde(transparent)]` serializes `UserId("u-1")` as plain `"u-1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The role a backend assigned to a user.
///
/// Unknown roles deserialize into [`Role::Other`] rather than failing, so a
/// backend adding a new role doesn't break sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    #[serde(untagged)]
    Other(String),
}

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// The profile of the signed-in user, as returned by the backend.
///
/// The session core stores this while authenticated and hands out clones
/// to readers. It never interprets the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Milliseconds since the Unix epoch.
    pub updated_at: u64,
}

// ---------------------------------------------------------------------------
// TokenPair
// ---------------------------------------------------------------------------

/// An access/refresh token pair plus its lifetime at issuance.
///
/// `expires_in` is seconds-to-live counted from the moment the backend
/// issued the pair. Turning that into "time until expiry" is the token
/// store's job, since only the store knows when the pair was received.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Tokens are secrets: keep them out of `{:?}` output so they never end up
/// in a log line by accident.
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Login input. Validation happens before it reaches the session core.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration input.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrationData {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl fmt::Debug for RegistrationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationData")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AuthGrant
// ---------------------------------------------------------------------------

/// What a successful login or registration hands back: who the user is,
/// and the tokens that prove it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

// =========================================================================
// Tests
// =========================================================================
