//! Payload types for tokenward.
//!
//! This crate defines the values the session core exchanges with an auth
//! backend: who the user is ([`UserProfile`]), what proves it
//! ([`TokenPair`]), and what the caller supplies to get one
//! ([`Credentials`], [`RegistrationData`]).
//!
//! It has no behavior of its own and no opinion about the wire format;
//! backends decide how these map onto their HTTP API.
//!
//! ```text
//! Session core (above)  ← stores profiles, hands tokens to the TokenStore
//!     ↕
//! Protocol types (this crate)
//!     ↕
//! AuthBackend implementation (below)  ← decodes responses into these types
//! ```

mod types;

pub use types::{
    AuthGrant, Credentials, RegistrationData, Role, TokenPair, UserId,
    UserProfile,
};
