//! The portal facade.
//!
//! Owns the identity provider, the chat dependencies and the current view,
//! and applies every user action as a view transition.

use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::view::{ChatSurface, PortalView};
use campus_desk_bot::{ConversationGateway, HttpBotRuntime};
use campus_desk_conversation::{
    Caller, ChatSession, ChatSettings, ConversationState, ResponseResolver, SendOutcome,
};
use campus_desk_platform_access::{
    CognitoIdentityProvider, IdentityProvider, LoginFlow, OfflineIdentityProvider,
    PasswordPolicy, SignUpRequest,
};
use rootcause::Report;
use std::sync::Arc;
use tracing::{info, warn};

/// The student portal.
pub struct Portal {
    identity: Arc<dyn IdentityProvider>,
    resolver: Arc<ResponseResolver>,
    gateway: Option<ConversationGateway>,
    chat_settings: ChatSettings,
    password_policy: PasswordPolicy,
    view: PortalView,
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("identity", &self.identity.name())
            .field("gateway", &self.gateway)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

impl Portal {
    /// Creates a signed-out portal.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        resolver: Arc<ResponseResolver>,
        gateway: Option<ConversationGateway>,
        chat_settings: ChatSettings,
    ) -> Self {
        let password_policy = PasswordPolicy::default();
        Self {
            identity,
            resolver,
            gateway,
            chat_settings,
            password_policy,
            view: PortalView::SignedOut(LoginFlow::new(password_policy)),
        }
    }

    /// Builds a portal from configuration.
    #[must_use]
    pub fn from_config(config: &PortalConfig) -> Self {
        let identity: Arc<dyn IdentityProvider> = match &config.identity {
            Some(identity) => Arc::new(CognitoIdentityProvider::new(identity.clone())),
            None => {
                info!("no identity pool configured, using offline sign-in");
                Arc::new(OfflineIdentityProvider::default())
            }
        };

        let gateway = match &config.bot {
            Some(bot) => {
                let runtime = Arc::new(HttpBotRuntime::new(bot.endpoint()));
                Some(
                    ConversationGateway::new(runtime, bot.clone())
                        .with_timeout(config.chat.reply_timeout()),
                )
            }
            None => {
                info!("no bot configured, chat answers locally");
                None
            }
        };

        Self::new(
            identity,
            Arc::new(ResponseResolver::default()),
            gateway,
            config.chat.settings(),
        )
    }

    /// Returns the current view.
    #[must_use]
    pub fn view(&self) -> &PortalView {
        &self.view
    }

    /// Returns the chat session while signed in.
    #[must_use]
    pub fn chat(&self) -> Option<&ChatSession> {
        match &self.view {
            PortalView::SignedIn { chat, .. } => Some(chat),
            PortalView::SignedOut(_) => None,
        }
    }

    fn login_mut(&mut self) -> Result<&mut LoginFlow, Report<PortalError>> {
        match &mut self.view {
            PortalView::SignedOut(flow) => Ok(flow),
            PortalView::SignedIn { .. } => Err(PortalError::AlreadySignedIn.into()),
        }
    }

    /// Switches the login surface to the sign-up form.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySignedIn` on the dashboard.
    pub fn show_sign_up(&mut self) -> Result<(), Report<PortalError>> {
        self.login_mut()?.show_sign_up();
        Ok(())
    }

    /// Switches the login surface to the sign-in form.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySignedIn` on the dashboard.
    pub fn show_sign_in(&mut self) -> Result<(), Report<PortalError>> {
        self.login_mut()?.show_sign_in();
        Ok(())
    }

    /// Submits the sign-in form. Returns true if the dashboard is now shown.
    ///
    /// Form errors are kept on the login flow.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySignedIn` on the dashboard.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<bool, Report<PortalError>> {
        let provider = Arc::clone(&self.identity);
        let Some(session) = self.login_mut()?.sign_in(provider.as_ref(), email, password).await
        else {
            return Ok(false);
        };

        let mut chat = ChatSession::new(Arc::clone(&self.resolver), self.chat_settings.clone());
        if let Some(gateway) = &self.gateway {
            chat = chat
                .with_gateway(gateway.clone())
                .with_caller(Caller::from_session(&session));
        }
        info!(route = ?chat.route(), "signed in");

        self.view = PortalView::SignedIn {
            session,
            chat,
            surface: ChatSurface::Closed,
        };
        Ok(true)
    }

    /// Submits the sign-up form.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySignedIn` on the dashboard.
    pub async fn sign_up(&mut self, request: &SignUpRequest) -> Result<(), Report<PortalError>> {
        let provider = Arc::clone(&self.identity);
        self.login_mut()?.sign_up(provider.as_ref(), request).await;
        Ok(())
    }

    /// Submits a verification code.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySignedIn` on the dashboard.
    pub async fn verify(&mut self, code: &str) -> Result<(), Report<PortalError>> {
        let provider = Arc::clone(&self.identity);
        self.login_mut()?.verify(provider.as_ref(), code).await;
        Ok(())
    }

    /// Requests a new verification code.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySignedIn` on the dashboard.
    pub async fn resend_code(&mut self) -> Result<(), Report<PortalError>> {
        let provider = Arc::clone(&self.identity);
        self.login_mut()?.resend_code(provider.as_ref()).await;
        Ok(())
    }

    /// Signs out, closing the chat and returning to the login surface.
    ///
    /// A provider-side sign-out failure is logged; the local session ends
    /// regardless.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` on the login surface.
    pub async fn sign_out(&mut self) -> Result<(), Report<PortalError>> {
        let PortalView::SignedIn { session, chat, .. } = &self.view else {
            return Err(PortalError::NotSignedIn.into());
        };

        chat.close().await;
        if let Err(report) = self.identity.sign_out(session).await {
            warn!(error = %report.current_context(), "provider sign-out failed");
        }

        self.view = PortalView::SignedOut(LoginFlow::new(self.password_policy));
        info!("signed out");
        Ok(())
    }

    /// Opens the chat if closed, closes it if open.
    ///
    /// Returns the fresh conversation when the chat was opened.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` on the login surface.
    pub async fn toggle_chat(&mut self) -> Result<Option<ConversationState>, Report<PortalError>> {
        let PortalView::SignedIn { chat, surface, .. } = &mut self.view else {
            return Err(PortalError::NotSignedIn.into());
        };

        match *surface {
            ChatSurface::Closed => {
                let state = chat.open().await;
                *surface = ChatSurface::Open;
                Ok(Some(state))
            }
            ChatSurface::Open => {
                chat.close().await;
                *surface = ChatSurface::Closed;
                Ok(None)
            }
        }
    }

    /// Sends text on the chat surface.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` on the login surface.
    pub async fn say(&self, text: &str) -> Result<SendOutcome, Report<PortalError>> {
        let chat = self.chat().ok_or(PortalError::NotSignedIn)?;
        Ok(chat.send(text).await)
    }

    /// Sends a suggestion on the chat surface.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` on the login surface.
    pub async fn suggest(&self, index: usize) -> Result<SendOutcome, Report<PortalError>> {
        let chat = self.chat().ok_or(PortalError::NotSignedIn)?;
        Ok(chat.send_suggestion(index).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_desk_conversation::{GREETING, Rejection};
    use campus_desk_platform_access::AuthView;

    fn offline_portal() -> Portal {
        Portal::new(
            Arc::new(OfflineIdentityProvider::default()),
            Arc::new(ResponseResolver::default()),
            None,
            ChatSettings::default(),
        )
    }

    #[tokio::test]
    async fn starts_signed_out() {
        let portal = offline_portal();

        assert!(!portal.view().is_signed_in());
        assert_eq!(portal.view().login().map(LoginFlow::view), Some(&AuthView::SignIn));
        assert_eq!(portal.view().chat_surface(), ChatSurface::Closed);
        assert!(portal.chat().is_none());
    }

    #[tokio::test]
    async fn chat_needs_sign_in() {
        let mut portal = offline_portal();

        let err = portal.toggle_chat().await.unwrap_err();
        assert_eq!(err.current_context(), &PortalError::NotSignedIn);
        assert!(portal.say("hello").await.is_err());
    }

    #[tokio::test]
    async fn failed_sign_in_keeps_login_surface() {
        let mut portal = offline_portal();

        assert!(!portal.sign_in("", "").await.expect("login surface"));

        let flow = portal.view().login().expect("signed out");
        assert_eq!(flow.error(), Some("Please enter both email and password"));
    }

    #[tokio::test]
    async fn sign_in_chat_and_sign_out() {
        let mut portal = offline_portal();
        assert!(portal.sign_in("alice@example.edu", "pw").await.expect("sign in"));
        assert!(portal.view().is_signed_in());

        let state = portal.toggle_chat().await.expect("toggle").expect("opened");
        assert_eq!(state.history()[0].text(), GREETING);
        assert_eq!(portal.view().chat_surface(), ChatSurface::Open);

        let SendOutcome::Replied(reply) = portal.say("library hours").await.expect("say") else {
            panic!("expected a reply");
        };
        assert!(reply.text().starts_with("The library is open"));

        assert!(portal.toggle_chat().await.expect("toggle").is_none());
        assert_eq!(
            portal.say("hello").await.expect("say"),
            SendOutcome::Rejected(Rejection::SurfaceClosed)
        );

        portal.sign_out().await.expect("sign out");
        assert!(!portal.view().is_signed_in());
        assert_eq!(portal.view().chat_surface(), ChatSurface::Closed);
    }

    #[tokio::test]
    async fn login_actions_rejected_on_dashboard() {
        let mut portal = offline_portal();
        portal.sign_in("alice@example.edu", "pw").await.expect("sign in");

        let err = portal.sign_in("alice@example.edu", "pw").await.unwrap_err();
        assert_eq!(err.current_context(), &PortalError::AlreadySignedIn);
        assert!(portal.show_sign_up().is_err());
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_greets_by_name() {
        let mut portal = offline_portal();
        portal.show_sign_up().expect("signed out");
        portal
            .sign_up(&SignUpRequest {
                name: "Alice".to_string(),
                student_id: "S1001".to_string(),
                email: "alice@example.edu".to_string(),
                password: "Str0ng!pass".to_string(),
            })
            .await
            .expect("signed out");

        let flow = portal.view().login().expect("signed out");
        assert_eq!(flow.view(), &AuthView::SignIn);

        portal.sign_in("alice@example.edu", "Str0ng!pass").await.expect("sign in");
        let identity = portal.view().identity().expect("signed in");
        assert_eq!(identity.display_name(), Some("Alice"));
        assert_eq!(identity.session_key(), "S1001");
    }

    #[tokio::test]
    async fn sign_out_on_login_surface_is_an_error() {
        let mut portal = offline_portal();
        let err = portal.sign_out().await.unwrap_err();
        assert_eq!(err.current_context(), &PortalError::NotSignedIn);
    }

    #[test]
    fn from_config_without_sections_is_local_and_offline() {
        let portal = Portal::from_config(&PortalConfig::default());
        assert!(portal.gateway.is_none());
        assert_eq!(portal.identity.name(), "offline");
    }
}
