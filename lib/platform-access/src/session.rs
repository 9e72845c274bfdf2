//! Authenticated sessions.
//!
//! An `AuthSession` is created by a successful sign-in. It carries the
//! provider tokens and the identity resolved for the signed-in student.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Tokens issued by the identity provider at sign-in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// ID token (carries the user's claims).
    pub id_token: String,
    /// Access token (authorizes user-scoped provider calls).
    pub access_token: String,
    /// Refresh token, when the provider issued one.
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("id_token", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Represents an active authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// The signed-in student.
    identity: Identity,
    /// Provider tokens; absent for offline sessions.
    tokens: Option<SessionTokens>,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// When the session expires.
    expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Creates a session without provider tokens.
    #[must_use]
    pub fn new(identity: Identity, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            identity,
            tokens: None,
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// Creates a session holding provider tokens.
    #[must_use]
    pub fn with_tokens(identity: Identity, tokens: SessionTokens, duration: Duration) -> Self {
        let mut session = Self::new(identity, duration);
        session.tokens = Some(tokens);
        session
    }

    /// Returns the signed-in identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Replaces the identity, e.g. after re-reading user attributes.
    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    /// Returns the provider tokens, if present.
    #[must_use]
    pub fn tokens(&self) -> Option<&SessionTokens> {
        self.tokens.as_ref()
    }

    /// Returns the ID token, if present.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.id_token.as_str())
    }

    /// Returns the access token, if present.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the session is still valid (not expired).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}
