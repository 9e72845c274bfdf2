//! Conversation gateway.
//!
//! Formats one user utterance plus the caller's identity into a runtime
//! request and normalizes the reply into a single plain-text string.

use crate::error::GatewayError;
use crate::runtime::{BotConfig, BotRuntime, RecognizeTextRequest};
use campus_desk_core::RequestId;
use campus_desk_platform_access::{GUEST_SESSION_KEY, Identity};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Reply used when the bot answers with no text.
pub const FALLBACK_REPLY: &str = "I didn't understand that. Try again?";

/// Time allowed for one runtime round trip.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(12);

/// Stateless delegate to a bot runtime.
#[derive(Clone)]
pub struct ConversationGateway {
    runtime: Arc<dyn BotRuntime>,
    config: BotConfig,
    timeout: Duration,
}

impl fmt::Debug for ConversationGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationGateway")
            .field("runtime", &self.runtime.name())
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ConversationGateway {
    /// Creates a gateway with the default reply timeout.
    #[must_use]
    pub fn new(runtime: Arc<dyn BotRuntime>, config: BotConfig) -> Self {
        Self {
            runtime,
            config,
            timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Sets the reply timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the bot configuration.
    #[must_use]
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Returns the reply timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the runtime request for one utterance.
    #[must_use]
    pub fn build_request(
        &self,
        text: &str,
        session_key: &str,
        identity: &Identity,
        bearer_token: Option<&str>,
    ) -> RecognizeTextRequest {
        RecognizeTextRequest {
            bot_id: self.config.bot_id.clone(),
            bot_alias_id: self.config.bot_alias_id.clone(),
            locale_id: self.config.locale_id.clone(),
            session_id: session_key.to_string(),
            text: text.to_string(),
            session_attributes: session_attributes(identity),
            bearer_token: bearer_token.map(str::to_string),
        }
    }

    /// Sends one utterance and returns the reply text.
    ///
    /// Multiple reply fragments are joined with newlines. A reply without
    /// any text yields [`FALLBACK_REPLY`].
    ///
    /// # Errors
    ///
    /// Returns `UpstreamUnavailable` when the runtime cannot be reached or
    /// does not answer within the timeout, and `MalformedReply` when its
    /// answer cannot be read.
    #[instrument(skip_all, fields(runtime = self.runtime.name(), session_key = %session_key))]
    pub async fn send(
        &self,
        text: &str,
        session_key: &str,
        identity: &Identity,
        bearer_token: Option<&str>,
    ) -> campus_desk_core::Result<String, GatewayError> {
        let request_id = RequestId::new();
        let request = self.build_request(text, session_key, identity, bearer_token);
        let started = Instant::now();

        let reply = tokio::time::timeout(self.timeout, self.runtime.recognize_text(&request))
            .await
            .map_err(|_| GatewayError::UpstreamUnavailable {
                reason: format!("no reply within {}s", self.timeout.as_secs_f32()),
            })??;

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            %request_id,
            latency_ms,
            fragments = reply.fragments.len(),
            "bot reply received"
        );

        Ok(reply
            .joined_text()
            .unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }
}

/// Session attributes sent with every utterance.
#[must_use]
pub fn session_attributes(identity: &Identity) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    attributes.insert(
        "cognito_username".to_string(),
        identity.username().unwrap_or(GUEST_SESSION_KEY).to_string(),
    );
    attributes.insert(
        "email".to_string(),
        identity.email().unwrap_or_default().to_string(),
    );
    attributes.insert(
        "name".to_string(),
        identity.display_name().unwrap_or_default().to_string(),
    );
    attributes.insert(
        "student_id".to_string(),
        identity.student_id().unwrap_or(GUEST_SESSION_KEY).to_string(),
    );
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{BotReply, ReplyFragment};
    use async_trait::async_trait;
    use rootcause::Report;
    use std::sync::Mutex;

    /// Runtime returning a fixed reply and recording requests.
    struct ScriptedRuntime {
        reply: BotReply,
        seen: Mutex<Vec<RecognizeTextRequest>>,
    }

    impl ScriptedRuntime {
        fn new(fragments: &[&str]) -> Self {
            Self {
                reply: BotReply::new(fragments.iter().map(|f| ReplyFragment::plain(*f)).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BotRuntime for ScriptedRuntime {
        async fn recognize_text(
            &self,
            request: &RecognizeTextRequest,
        ) -> Result<BotReply, Report<GatewayError>> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Runtime failing every call.
    struct FailingRuntime(GatewayError);

    #[async_trait]
    impl BotRuntime for FailingRuntime {
        async fn recognize_text(
            &self,
            _request: &RecognizeTextRequest,
        ) -> Result<BotReply, Report<GatewayError>> {
            Err(self.0.clone().into())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Runtime that never answers.
    struct SilentRuntime;

    #[async_trait]
    impl BotRuntime for SilentRuntime {
        async fn recognize_text(
            &self,
            _request: &RecognizeTextRequest,
        ) -> Result<BotReply, Report<GatewayError>> {
            std::future::pending().await
        }

        fn name(&self) -> &str {
            "silent"
        }
    }

    fn config() -> BotConfig {
        BotConfig::new("BOT1", "ALIAS1", "us-east-1")
    }

    fn student() -> Identity {
        Identity::with_all_fields(
            Some("alice".to_string()),
            Some("Alice".to_string()),
            Some("alice@example.edu".to_string()),
            Some("S1001".to_string()),
        )
    }

    #[tokio::test]
    async fn joins_fragments_with_newlines() {
        let runtime = Arc::new(ScriptedRuntime::new(&["First.", "Second."]));
        let gateway = ConversationGateway::new(runtime, config());

        let reply = gateway
            .send("hello", "S1001", &student(), None)
            .await
            .expect("reply");

        assert_eq!(reply, "First.\nSecond.");
    }

    #[tokio::test]
    async fn empty_reply_uses_fallback() {
        let runtime = Arc::new(ScriptedRuntime::new(&[]));
        let gateway = ConversationGateway::new(runtime, config());

        let reply = gateway
            .send("hello", "guest", &Identity::new(), None)
            .await
            .expect("reply");

        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn request_carries_identity_and_session_key() {
        let runtime = Arc::new(ScriptedRuntime::new(&["ok"]));
        let gateway = ConversationGateway::new(runtime.clone(), config().with_locale("en_GB"));

        gateway
            .send("tuition", "S1001", &student(), Some("id-token"))
            .await
            .expect("reply");

        let seen = runtime.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.session_id, "S1001");
        assert_eq!(request.locale_id, "en_GB");
        assert_eq!(request.text, "tuition");
        assert_eq!(request.bearer_token.as_deref(), Some("id-token"));
        assert_eq!(request.session_attributes["name"], "Alice");
        assert_eq!(request.session_attributes["cognito_username"], "alice");
    }

    #[test]
    fn anonymous_attributes_use_defaults() {
        let attributes = session_attributes(&Identity::new());

        assert_eq!(attributes["cognito_username"], "guest");
        assert_eq!(attributes["email"], "");
        assert_eq!(attributes["name"], "");
        assert_eq!(attributes["student_id"], "guest");
    }

    #[tokio::test]
    async fn runtime_errors_propagate() {
        let runtime = Arc::new(FailingRuntime(GatewayError::MalformedReply {
            reason: "garbage".to_string(),
        }));
        let gateway = ConversationGateway::new(runtime, config());

        let err = gateway
            .send("hello", "guest", &Identity::new(), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            GatewayError::MalformedReply { .. }
        ));
    }

    #[tokio::test]
    async fn timeout_is_upstream_unavailable() {
        let gateway = ConversationGateway::new(Arc::new(SilentRuntime), config())
            .with_timeout(Duration::from_millis(20));

        let err = gateway
            .send("hello", "guest", &Identity::new(), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            GatewayError::UpstreamUnavailable { .. }
        ));
    }
}
