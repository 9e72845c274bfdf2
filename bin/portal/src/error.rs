//! Domain error types for portal operations.

use std::fmt;

/// Errors from portal operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    /// Configuration could not be loaded.
    Config { reason: String },
    /// The operation needs a signed-in student.
    NotSignedIn,
    /// The operation is only available on the login surface.
    AlreadySignedIn,
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "invalid configuration: {reason}"),
            Self::NotSignedIn => write!(f, "not signed in"),
            Self::AlreadySignedIn => write!(f, "already signed in"),
        }
    }
}

impl std::error::Error for PortalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = PortalError::Config {
            reason: "missing field `client_id`".to_string(),
        };
        assert!(err.to_string().contains("client_id"));
    }
}
