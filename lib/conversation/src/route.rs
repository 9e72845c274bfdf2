//! Reply route selection.

use campus_desk_platform_access::{AuthSession, Identity};
use serde::{Deserialize, Serialize};

/// Which path answers a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyRoute {
    /// The in-process keyword resolver.
    Local,
    /// The remote bot runtime.
    Remote,
}

impl ReplyRoute {
    /// Picks the route: remote only when a gateway is configured and a
    /// caller identity is available.
    #[must_use]
    pub fn select(gateway_configured: bool, caller_known: bool) -> Self {
        if gateway_configured && caller_known {
            Self::Remote
        } else {
            Self::Local
        }
    }
}

/// The signed-in user on whose behalf remote turns are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    identity: Identity,
    bearer_token: Option<String>,
}

impl Caller {
    /// Creates a caller without a bearer token.
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            bearer_token: None,
        }
    }

    /// Creates a caller from a signed-in session, forwarding its id token.
    #[must_use]
    pub fn from_session(session: &AuthSession) -> Self {
        Self {
            identity: session.identity().clone(),
            bearer_token: session.id_token().map(str::to_string),
        }
    }

    /// Returns the caller identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the session key correlating turns on the runtime.
    #[must_use]
    pub fn session_key(&self) -> &str {
        self.identity.session_key()
    }

    /// Returns the bearer token, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }
}
