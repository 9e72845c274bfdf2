//! Login surface state machine.
//!
//! The login surface shows exactly one of three forms. Transitions are
//! driven by form submissions and by the classification of provider
//! errors (an unverified account jumps straight to the verify form).

use crate::error::AuthError;
use crate::password::PasswordPolicy;
use crate::provider::{IdentityProvider, SignUpOutcome, SignUpRequest};
use crate::session::AuthSession;
use tracing::{info, warn};

/// The form currently shown on the login surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthView {
    /// Email + password form.
    SignIn,
    /// Account creation form.
    SignUp,
    /// Confirmation code form for the given email.
    Verify { email: String },
}

/// Drives the login surface against an identity provider.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    view: AuthView,
    error: Option<String>,
    notice: Option<String>,
    policy: PasswordPolicy,
}

impl Default for LoginFlow {
    fn default() -> Self {
        Self::new(PasswordPolicy::default())
    }
}

impl LoginFlow {
    /// Creates a flow showing the sign-in form.
    #[must_use]
    pub fn new(policy: PasswordPolicy) -> Self {
        Self {
            view: AuthView::SignIn,
            error: None,
            notice: None,
            policy,
        }
    }

    /// Returns the form currently shown.
    #[must_use]
    pub fn view(&self) -> &AuthView {
        &self.view
    }

    /// Returns the error from the last submission, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the informational notice from the last submission, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Switches to the sign-up form.
    pub fn show_sign_up(&mut self) {
        self.transition(AuthView::SignUp);
    }

    /// Switches to the sign-in form.
    pub fn show_sign_in(&mut self) {
        self.transition(AuthView::SignIn);
    }

    fn transition(&mut self, view: AuthView) {
        self.view = view;
        self.error = None;
        self.notice = None;
    }

    fn begin_submission(&mut self) {
        self.error = None;
        self.notice = None;
    }

    /// Submits the sign-in form.
    ///
    /// Returns the new session on success. On failure the form error is
    /// set; an unverified account moves the flow to the verify form.
    pub async fn sign_in(
        &mut self,
        provider: &dyn IdentityProvider,
        email: &str,
        password: &str,
    ) -> Option<AuthSession> {
        self.begin_submission();

        if email.trim().is_empty() || password.trim().is_empty() {
            self.error = Some("Please enter both email and password".to_string());
            return None;
        }

        match provider.sign_in(email.trim(), password).await {
            Ok(session) => {
                info!(provider = provider.name(), "sign-in succeeded");
                self.view = AuthView::SignIn;
                Some(session)
            }
            Err(report) => {
                let err = report.current_context();
                warn!(provider = provider.name(), error = %err, "sign-in failed");
                if matches!(err, AuthError::UnverifiedAccount) {
                    self.view = AuthView::Verify {
                        email: email.trim().to_string(),
                    };
                }
                self.error = Some(err.user_message());
                None
            }
        }
    }

    /// Submits the sign-up form.
    pub async fn sign_up(&mut self, provider: &dyn IdentityProvider, request: &SignUpRequest) {
        self.begin_submission();

        if request.has_blank_field() {
            self.error = Some("Please fill in all fields".to_string());
            return;
        }
        if let Err(err) = self.policy.validate(&request.password) {
            self.error = Some(err.user_message());
            return;
        }

        match provider.sign_up(request).await {
            Ok(SignUpOutcome::ConfirmationRequired { .. }) => {
                self.view = AuthView::Verify {
                    email: request.email.trim().to_string(),
                };
                self.notice = Some(
                    "Sign up successful! Please check your email for a verification code."
                        .to_string(),
                );
            }
            Ok(SignUpOutcome::Confirmed) => {
                self.view = AuthView::SignIn;
                self.notice = Some("Account created. You can now log in.".to_string());
            }
            Err(report) => {
                let err = report.current_context();
                warn!(provider = provider.name(), error = %err, "sign-up failed");
                self.error = Some(err.user_message());
            }
        }
    }

    /// Submits the verification code form.
    pub async fn verify(&mut self, provider: &dyn IdentityProvider, code: &str) {
        self.begin_submission();

        let AuthView::Verify { email } = &self.view else {
            self.error = Some("No account is awaiting verification.".to_string());
            return;
        };
        if code.trim().is_empty() {
            self.error = Some("Please enter the verification code".to_string());
            return;
        }

        match provider.confirm_sign_up(email, code.trim()).await {
            Ok(()) => {
                self.view = AuthView::SignIn;
                self.notice = Some("Email verified! You can now log in.".to_string());
            }
            Err(report) => {
                let err = report.current_context();
                warn!(provider = provider.name(), error = %err, "verification failed");
                self.error = Some(err.user_message());
            }
        }
    }

    /// Requests a new verification code.
    pub async fn resend_code(&mut self, provider: &dyn IdentityProvider) {
        self.begin_submission();

        let AuthView::Verify { email } = &self.view else {
            self.error = Some("No account is awaiting verification.".to_string());
            return;
        };

        match provider.resend_code(email).await {
            Ok(()) => {
                self.notice = Some("Verification code resent! Check your email.".to_string());
            }
            Err(report) => {
                warn!(provider = provider.name(), error = %report.current_context(), "resend failed");
                self.error = Some("Failed to resend code. Please try again.".to_string());
            }
        }
    }
}
