//! Identity provider used when no user pool is configured.
//!
//! Accepts any non-empty credentials. Accounts registered through
//! `sign_up` are remembered for the lifetime of the provider so their
//! name and student id show up after sign-in.

use crate::error::AuthError;
use crate::identity::Identity;
use crate::provider::{IdentityProvider, SignUpOutcome, SignUpRequest};
use crate::session::AuthSession;
use async_trait::async_trait;
use chrono::Duration;
use rootcause::Report;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-process identity provider without any backing service.
#[derive(Debug)]
pub struct OfflineIdentityProvider {
    accounts: Mutex<HashMap<String, Identity>>,
    session_duration: Duration,
}

impl Default for OfflineIdentityProvider {
    fn default() -> Self {
        Self::new(Duration::hours(8))
    }
}

impl OfflineIdentityProvider {
    /// Creates a provider issuing sessions of the given duration.
    #[must_use]
    pub fn new(session_duration: Duration) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            session_duration,
        }
    }
}

fn account_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for OfflineIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, Report<AuthError>> {
        if email.trim().is_empty() || password.trim().is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }

        let identity = self
            .accounts
            .lock()
            .await
            .get(&account_key(email))
            .cloned()
            .unwrap_or_else(|| {
                let mut identity = Identity::new();
                identity.set_email(Some(email.trim().to_string()));
                identity
            });

        debug!(email = %email.trim(), "offline sign-in accepted");
        Ok(AuthSession::new(identity, self.session_duration))
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, Report<AuthError>> {
        let key = account_key(&request.email);
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&key) {
            return Err(AuthError::UsernameExists.into());
        }

        let identity = Identity::with_all_fields(
            Some(key.clone()),
            Some(request.name.clone()),
            Some(request.email.trim().to_string()),
            Some(request.student_id.clone()),
        );
        accounts.insert(key, identity);
        Ok(SignUpOutcome::Confirmed)
    }

    async fn confirm_sign_up(&self, _email: &str, code: &str) -> Result<(), Report<AuthError>> {
        if code.trim().is_empty() {
            return Err(AuthError::InvalidCode.into());
        }
        Ok(())
    }

    async fn resend_code(&self, _email: &str) -> Result<(), Report<AuthError>> {
        Ok(())
    }

    async fn sign_out(&self, _session: &AuthSession) -> Result<(), Report<AuthError>> {
        Ok(())
    }

    async fn current_identity(&self, session: &AuthSession) -> Result<Identity, Report<AuthError>> {
        Ok(session.identity().clone())
    }

    fn name(&self) -> &str {
        "offline"
    }
}
