//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `AuthError`: failures reported by the identity provider, classified
//!   into the handful of cases the login surface distinguishes

use std::fmt;

/// Errors from identity provider operations.
///
/// Every variant carries enough information to produce the text shown on
/// the login form via [`AuthError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The account exists but its email has not been confirmed yet.
    UnverifiedAccount,
    /// Wrong email/password combination.
    InvalidCredentials,
    /// No account exists for the given email.
    UnknownUser,
    /// Sign-up attempted for an email that is already registered.
    UsernameExists,
    /// The password does not satisfy the pool's password policy.
    InvalidPassword { reason: String },
    /// The confirmation code is wrong or has expired.
    InvalidCode,
    /// The provider could not be reached.
    Transport { reason: String },
    /// Any other provider failure.
    Generic { message: String },
}

const GENERIC_FAILURE: &str = "Login failed. Please try again.";

impl AuthError {
    /// Maps a provider-supplied error classification onto a variant.
    ///
    /// `kind` is the provider's error type name; both the bare name
    /// (`NotAuthorizedException`) and the namespaced form
    /// (`com.amazonaws...#NotAuthorizedException`) are accepted.
    #[must_use]
    pub fn classify(kind: &str, message: impl Into<String>) -> Self {
        let kind = kind.rsplit('#').next().unwrap_or(kind);
        let message = message.into();
        match kind {
            "UserNotConfirmedException" => Self::UnverifiedAccount,
            "NotAuthorizedException" => Self::InvalidCredentials,
            "UserNotFoundException" => Self::UnknownUser,
            "UsernameExistsException" => Self::UsernameExists,
            "InvalidPasswordException" => Self::InvalidPassword { reason: message },
            "CodeMismatchException" | "ExpiredCodeException" => Self::InvalidCode,
            _ => Self::Generic { message },
        }
    }

    /// Returns the text to show on the login form for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnverifiedAccount => "Please verify your email first. Check your inbox.".into(),
            Self::InvalidCredentials => "Invalid email or password".into(),
            Self::UnknownUser => "User not found. Please sign up first.".into(),
            Self::UsernameExists => "This email is already registered. Please log in.".into(),
            Self::InvalidPassword { .. } => "Password must be at least 8 characters with uppercase, lowercase, numbers, and special characters.".into(),
            Self::InvalidCode => "Verification failed. Please check the code and try again.".into(),
            Self::Transport { .. } => GENERIC_FAILURE.into(),
            Self::Generic { message } if message.trim().is_empty() => GENERIC_FAILURE.into(),
            Self::Generic { message } => message.clone(),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnverifiedAccount => write!(f, "account email is not verified"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::UnknownUser => write!(f, "user not found"),
            Self::UsernameExists => write!(f, "username already exists"),
            Self::InvalidPassword { reason } => {
                write!(f, "password rejected by policy: {reason}")
            }
            Self::InvalidCode => write!(f, "confirmation code is invalid or expired"),
            Self::Transport { reason } => {
                write!(f, "identity provider unreachable: {reason}")
            }
            Self::Generic { message } => write!(f, "identity provider error: {message}"),
        }
    }
}

impl std::error::Error for AuthError {}
