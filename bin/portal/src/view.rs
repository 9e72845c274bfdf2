//! Portal view state machine.
//!
//! The portal is either on the login surface or on the dashboard. Only a
//! signed-in view owns a chat, so a chat open while signed out cannot be
//! expressed.

use campus_desk_conversation::ChatSession;
use campus_desk_platform_access::{AuthSession, Identity, LoginFlow};

/// Whether the chat surface is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSurface {
    Closed,
    Open,
}

/// What the portal is currently showing.
#[derive(Debug)]
pub enum PortalView {
    /// The login surface.
    SignedOut(LoginFlow),
    /// The dashboard, with its chat surface.
    SignedIn {
        session: AuthSession,
        chat: ChatSession,
        surface: ChatSurface,
    },
}

impl PortalView {
    /// Returns true on the dashboard.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    /// Returns the login flow while signed out.
    #[must_use]
    pub fn login(&self) -> Option<&LoginFlow> {
        match self {
            Self::SignedOut(flow) => Some(flow),
            Self::SignedIn { .. } => None,
        }
    }

    /// Returns the signed-in identity.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn { session, .. } => Some(session.identity()),
            Self::SignedOut(_) => None,
        }
    }

    /// Returns the chat surface state; always closed while signed out.
    #[must_use]
    pub fn chat_surface(&self) -> ChatSurface {
        match self {
            Self::SignedIn { surface, .. } => *surface,
            Self::SignedOut(_) => ChatSurface::Closed,
        }
    }
}
