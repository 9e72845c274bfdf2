//! The identity provider seam.
//!
//! Credential issuance and verification belong to an external managed
//! service. The portal only talks to it through [`IdentityProvider`].

use crate::error::AuthError;
use crate::identity::Identity;
use crate::session::AuthSession;
use async_trait::async_trait;
use rootcause::Report;

/// Fields collected by the sign-up form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    /// Full name.
    pub name: String,
    /// Institution-issued student id.
    pub student_id: String,
    /// Email address; also the sign-in username.
    pub email: String,
    /// Chosen password.
    pub password: String,
}

impl SignUpRequest {
    /// Returns true if any field is blank.
    #[must_use]
    pub fn has_blank_field(&self) -> bool {
        [&self.name, &self.student_id, &self.email, &self.password]
            .iter()
            .any(|field| field.trim().is_empty())
    }
}

/// Result of a successful sign-up call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account must be confirmed with a code sent to `destination`.
    ConfirmationRequired { destination: Option<String> },
    /// The account is usable immediately.
    Confirmed,
}

/// Trait for identity providers.
///
/// Implementations must classify provider failures into [`AuthError`]
/// variants so the login surface can pick the right form message.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Signs in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, Report<AuthError>>;

    /// Registers a new account.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, Report<AuthError>>;

    /// Confirms an account with the code delivered by email.
    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), Report<AuthError>>;

    /// Sends a fresh confirmation code.
    async fn resend_code(&self, email: &str) -> Result<(), Report<AuthError>>;

    /// Ends the session with the provider.
    async fn sign_out(&self, session: &AuthSession) -> Result<(), Report<AuthError>>;

    /// Re-reads the identity attributes for a session.
    async fn current_identity(&self, session: &AuthSession) -> Result<Identity, Report<AuthError>>;

    /// Returns a short name for logging.
    fn name(&self) -> &str;
}
