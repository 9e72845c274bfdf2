//! Chat session orchestration.
//!
//! A `ChatSession` owns the conversation shown on one chat surface. It
//! enforces a single outstanding turn: while a reply is pending every
//! further `send` is rejected, and each accepted user message is followed
//! by exactly one bot message.

use crate::message::{Message, Sender};
use crate::resolver::ResponseResolver;
use crate::route::{Caller, ReplyRoute};
use campus_desk_bot::{ConversationGateway, FALLBACK_REPLY, GatewayError};
use campus_desk_core::ConversationId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// First message of every conversation.
pub const GREETING: &str =
    "Hi! I'm your AI student services assistant. How can I help you today?";

/// Bot message appended when the remote runtime cannot be reached.
pub const APOLOGY: &str =
    "I'm sorry, I'm having trouble processing your request right now. Please try again.";

/// Quick prompts offered before the first message.
pub const DEFAULT_SUGGESTIONS: &[&str] = &[
    "Library hours",
    "Course registration",
    "Tuition balance",
    "Housing options",
];

/// Per-surface chat settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Whether suggestions are shown when the surface opens.
    pub show_suggestions: bool,
    /// Suggestion texts, sent verbatim when picked.
    pub suggestions: Vec<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            show_suggestions: true,
            suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Whether a turn is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Ready for the next user message.
    Idle,
    /// A user message is waiting for its reply.
    AwaitingReply,
}

/// The conversation shown on an open surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    id: ConversationId,
    history: Vec<Message>,
    phase: TurnPhase,
    suggestions_visible: bool,
}

impl ConversationState {
    /// Creates a fresh conversation holding only the greeting.
    #[must_use]
    pub fn fresh(settings: &ChatSettings) -> Self {
        Self {
            id: ConversationId::new(),
            history: vec![Message::bot(GREETING)],
            phase: TurnPhase::Idle,
            suggestions_visible: settings.show_suggestions && !settings.suggestions.is_empty(),
        }
    }

    /// Returns the conversation id.
    #[must_use]
    pub fn id(&self) -> ConversationId {
        self.id
    }

    /// Returns the messages in display order.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Returns the turn phase.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Returns true while a reply is pending.
    #[must_use]
    pub fn is_awaiting_reply(&self) -> bool {
        self.phase == TurnPhase::AwaitingReply
    }

    /// Returns true while suggestions should be shown.
    #[must_use]
    pub fn suggestions_visible(&self) -> bool {
        self.suggestions_visible
    }

    fn begin_turn(&mut self, text: &str) {
        self.history.push(Message::user(text));
        self.phase = TurnPhase::AwaitingReply;
        self.suggestions_visible = false;
    }

    fn finish_turn(&mut self, text: String) -> Message {
        let message = Message::bot(text);
        self.history.push(message.clone());
        self.phase = TurnPhase::Idle;
        message
    }
}

/// Why a send did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The input was empty or whitespace.
    EmptyInput,
    /// A previous turn has not finished.
    AwaitingReply,
    /// The surface is closed.
    SurfaceClosed,
    /// No suggestion exists at the given index.
    UnknownSuggestion,
    /// Suggestions are no longer offered.
    SuggestionsHidden,
}

/// Result of a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The turn completed with this bot message.
    Replied(Message),
    /// Nothing was changed.
    Rejected(Rejection),
    /// The surface closed before the reply arrived; the reply was dropped.
    Discarded,
}

enum Surface {
    Closed,
    Open {
        state: ConversationState,
        cancel: CancellationToken,
    },
}

/// Conversation orchestrator for one chat surface.
///
/// Cloning yields another handle to the same surface.
#[derive(Clone)]
pub struct ChatSession {
    surface: Arc<Mutex<Surface>>,
    resolver: Arc<ResponseResolver>,
    gateway: Option<ConversationGateway>,
    caller: Option<Caller>,
    settings: ChatSettings,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("route", &self.route())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Creates a closed session answering from the local resolver.
    #[must_use]
    pub fn new(resolver: Arc<ResponseResolver>, settings: ChatSettings) -> Self {
        Self {
            surface: Arc::new(Mutex::new(Surface::Closed)),
            resolver,
            gateway: None,
            caller: None,
            settings,
        }
    }

    /// Configures the remote gateway.
    #[must_use]
    pub fn with_gateway(mut self, gateway: ConversationGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Sets the user on whose behalf remote turns are sent.
    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Returns the route answering turns.
    #[must_use]
    pub fn route(&self) -> ReplyRoute {
        ReplyRoute::select(self.gateway.is_some(), self.caller.is_some())
    }

    /// Returns the chat settings.
    #[must_use]
    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Opens the surface with a fresh conversation.
    ///
    /// Reopening discards the previous conversation and drops any reply
    /// still in flight for it.
    pub async fn open(&self) -> ConversationState {
        let mut surface = self.surface.lock().await;
        if let Surface::Open { cancel, .. } = &*surface {
            cancel.cancel();
        }

        let state = ConversationState::fresh(&self.settings);
        debug!(conversation_id = %state.id(), "chat opened");
        *surface = Surface::Open {
            state: state.clone(),
            cancel: CancellationToken::new(),
        };
        state
    }

    /// Closes the surface and discards the conversation.
    pub async fn close(&self) {
        let mut surface = self.surface.lock().await;
        if let Surface::Open { state, cancel } = &*surface {
            cancel.cancel();
            debug!(conversation_id = %state.id(), "chat closed");
        }
        *surface = Surface::Closed;
    }

    /// Returns true if the surface is open.
    pub async fn is_open(&self) -> bool {
        matches!(*self.surface.lock().await, Surface::Open { .. })
    }

    /// Returns a copy of the current conversation, if the surface is open.
    pub async fn snapshot(&self) -> Option<ConversationState> {
        match &*self.surface.lock().await {
            Surface::Open { state, .. } => Some(state.clone()),
            Surface::Closed => None,
        }
    }

    /// Sends a user message and waits for the reply.
    ///
    /// Resolution failures never escape: they are logged and replaced by a
    /// bot message, so an accepted turn always ends `Idle`. The turn runs on
    /// its own task, so dropping this future does not leave the
    /// conversation awaiting a reply.
    pub async fn send(&self, raw_text: &str) -> SendOutcome {
        self.dispatch(raw_text.trim(), false).await
    }

    /// Sends the suggestion at `index`.
    ///
    /// Suggestions are only accepted while they are still shown.
    pub async fn send_suggestion(&self, index: usize) -> SendOutcome {
        let Some(text) = self.settings.suggestions.get(index) else {
            return SendOutcome::Rejected(Rejection::UnknownSuggestion);
        };
        self.dispatch(text.trim(), true).await
    }

    async fn dispatch(&self, text: &str, from_suggestion: bool) -> SendOutcome {
        let (conversation_id, cancel) = match self.begin(text, from_suggestion).await {
            Ok(turn) => turn,
            Err(rejection) => return SendOutcome::Rejected(rejection),
        };

        let turn = tokio::spawn({
            let chat = self.clone();
            let text = text.to_string();
            async move { chat.complete(&text, conversation_id, cancel).await }
        });

        match turn.await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%conversation_id, %error, "reply task failed");
                self.finish(conversation_id, APOLOGY.to_string()).await
            }
        }
    }

    async fn begin(
        &self,
        text: &str,
        from_suggestion: bool,
    ) -> Result<(ConversationId, CancellationToken), Rejection> {
        let mut surface = self.surface.lock().await;
        let Surface::Open { state, cancel } = &mut *surface else {
            return Err(Rejection::SurfaceClosed);
        };
        if text.is_empty() {
            return Err(Rejection::EmptyInput);
        }
        if from_suggestion && !state.suggestions_visible() {
            return Err(Rejection::SuggestionsHidden);
        }
        if state.is_awaiting_reply() {
            return Err(Rejection::AwaitingReply);
        }
        state.begin_turn(text);
        Ok((state.id(), cancel.clone()))
    }

    async fn complete(
        &self,
        text: &str,
        conversation_id: ConversationId,
        cancel: CancellationToken,
    ) -> SendOutcome {
        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(%conversation_id, "surface closed before reply");
                return SendOutcome::Discarded;
            }
            reply = self.reply_for(text) => reply,
        };
        self.finish(conversation_id, reply).await
    }

    async fn finish(&self, conversation_id: ConversationId, reply: String) -> SendOutcome {
        let mut surface = self.surface.lock().await;
        match &mut *surface {
            Surface::Open { state, .. } if state.id() == conversation_id => {
                SendOutcome::Replied(state.finish_turn(reply))
            }
            _ => {
                debug!(%conversation_id, "conversation replaced before reply");
                SendOutcome::Discarded
            }
        }
    }

    async fn reply_for(&self, text: &str) -> String {
        let (Some(gateway), Some(caller)) = (&self.gateway, &self.caller) else {
            return self.resolver.resolve(text).to_string();
        };

        let result = gateway
            .send(
                text,
                caller.session_key(),
                caller.identity(),
                caller.bearer_token(),
            )
            .await;

        match result {
            Ok(reply) => reply,
            Err(report) => match report.current_context() {
                GatewayError::MalformedReply { reason } => {
                    warn!(%reason, "unreadable bot reply");
                    FALLBACK_REPLY.to_string()
                }
                GatewayError::UpstreamUnavailable { reason } => {
                    warn!(%reason, "bot runtime unavailable");
                    APOLOGY.to_string()
                }
            },
        }
    }
}

/// Returns true if senders alternate, starting with the bot greeting.
#[must_use]
pub fn alternates(history: &[Message]) -> bool {
    history.first().is_some_and(|m| m.sender() == Sender::Bot)
        && history
            .windows(2)
            .all(|pair| !(pair[0].sender() == Sender::User && pair[1].sender() == Sender::User))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campus_desk_bot::{BotConfig, BotReply, BotRuntime, RecognizeTextRequest, ReplyFragment};
    use campus_desk_platform_access::Identity;
    use rootcause::Report;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Runtime answering with fixed text.
    struct EchoRuntime;

    #[async_trait]
    impl BotRuntime for EchoRuntime {
        async fn recognize_text(
            &self,
            request: &RecognizeTextRequest,
        ) -> Result<BotReply, Report<GatewayError>> {
            Ok(BotReply::new(vec![ReplyFragment::plain(format!(
                "{} asked: {}",
                request.session_id, request.text
            ))]))
        }

        fn name(&self) -> &str {
            "echo"
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

    /// Runtime that answers only after the gate is opened.
    struct GatedRuntime {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl BotRuntime for GatedRuntime {
        async fn recognize_text(
            &self,
            _request: &RecognizeTextRequest,
        ) -> Result<BotReply, Report<GatewayError>> {
            self.gate.notified().await;
            Ok(BotReply::new(vec![ReplyFragment::plain("finally")]))
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    fn local_session() -> ChatSession {
        ChatSession::new(Arc::new(ResponseResolver::default()), ChatSettings::default())
    }

    fn remote_session(runtime: Arc<dyn BotRuntime>) -> ChatSession {
        let gateway = ConversationGateway::new(runtime, BotConfig::new("BOT1", "ALIAS1", "us-east-1"))
            .with_timeout(Duration::from_secs(5));
        let identity = Identity::with_all_fields(None, Some("Alice".to_string()), None, Some("S1001".to_string()));
        local_session()
            .with_gateway(gateway)
            .with_caller(Caller::new(identity))
    }

    async fn wait_until_awaiting(chat: &ChatSession) {
        while !chat
            .snapshot()
            .await
            .is_some_and(|state| state.is_awaiting_reply())
        {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn open_starts_with_greeting() {
        let chat = local_session();

        let state = chat.open().await;

        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].text(), GREETING);
        assert_eq!(state.history()[0].sender(), Sender::Bot);
        assert!(!state.is_awaiting_reply());
        assert!(state.suggestions_visible());
    }

    #[tokio::test]
    async fn suggestions_follow_settings() {
        let settings = ChatSettings {
            show_suggestions: false,
            ..ChatSettings::default()
        };
        let chat = ChatSession::new(Arc::new(ResponseResolver::default()), settings);

        assert!(!chat.open().await.suggestions_visible());
    }

    #[tokio::test]
    async fn reopen_resets_conversation() {
        let chat = local_session();
        let first = chat.open().await;
        chat.send("library hours").await;

        let second = chat.open().await;

        assert_ne!(first.id(), second.id());
        assert_eq!(second.history().len(), 1);
        assert!(second.suggestions_visible());
        assert!(!second.is_awaiting_reply());
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let chat = local_session();
        chat.open().await;

        assert_eq!(
            chat.send("   ").await,
            SendOutcome::Rejected(Rejection::EmptyInput)
        );
        assert_eq!(chat.send("").await, SendOutcome::Rejected(Rejection::EmptyInput));

        let state = chat.snapshot().await.expect("open");
        assert_eq!(state.history().len(), 1);
        assert!(state.suggestions_visible());
    }

    #[tokio::test]
    async fn send_on_closed_surface_is_rejected() {
        let chat = local_session();
        assert_eq!(
            chat.send("hello").await,
            SendOutcome::Rejected(Rejection::SurfaceClosed)
        );

        chat.open().await;
        chat.close().await;
        assert!(chat.snapshot().await.is_none());
        assert!(!chat.is_open().await);
    }

    #[tokio::test]
    async fn local_route_answers_from_resolver() {
        let chat = local_session();
        chat.open().await;
        assert_eq!(chat.route(), ReplyRoute::Local);

        let SendOutcome::Replied(reply) = chat.send("What are the library hours?").await else {
            panic!("expected a reply");
        };

        assert_eq!(
            reply.text(),
            "The library is open from 8 AM - 8 PM, Monday through Friday, and 10 AM - 6 PM on weekends."
        );
        let state = chat.snapshot().await.expect("open");
        assert!(!state.suggestions_visible());
        assert!(!state.is_awaiting_reply());
    }

    #[tokio::test]
    async fn history_grows_by_turn_pairs() {
        let chat = local_session();
        chat.open().await;
        let inputs = ["hi", "tuition", "asdkjfasldkj nonsense", "thanks", "bye"];

        for input in inputs {
            assert!(matches!(chat.send(input).await, SendOutcome::Replied(_)));
        }

        let state = chat.snapshot().await.expect("open");
        assert_eq!(state.history().len(), 1 + 2 * inputs.len());
        assert!(alternates(state.history()));
        for (i, message) in state.history().iter().enumerate() {
            let expected = if i % 2 == 0 { Sender::Bot } else { Sender::User };
            assert_eq!(message.sender(), expected);
        }
    }

    #[tokio::test]
    async fn remote_route_uses_session_key() {
        let chat = remote_session(Arc::new(EchoRuntime));
        chat.open().await;
        assert_eq!(chat.route(), ReplyRoute::Remote);

        let SendOutcome::Replied(reply) = chat.send("  library hours ").await else {
            panic!("expected a reply");
        };

        assert_eq!(reply.text(), "S1001 asked: library hours");
    }

    #[tokio::test]
    async fn gateway_without_caller_stays_local() {
        let gateway = ConversationGateway::new(
            Arc::new(EchoRuntime),
            BotConfig::new("BOT1", "ALIAS1", "us-east-1"),
        );
        let chat = local_session().with_gateway(gateway);
        chat.open().await;
        assert_eq!(chat.route(), ReplyRoute::Local);

        let SendOutcome::Replied(reply) = chat.send("gpa").await else {
            panic!("expected a reply");
        };
        assert_eq!(reply.text(), "Your current cumulative GPA is 3.7 out of 4.0.");
    }

    #[tokio::test]
    async fn upstream_failure_appends_apology() {
        let chat = remote_session(Arc::new(FailingRuntime(
            GatewayError::UpstreamUnavailable {
                reason: "connection refused".to_string(),
            },
        )));
        chat.open().await;

        let SendOutcome::Replied(reply) = chat.send("tuition").await else {
            panic!("expected a reply");
        };

        assert_eq!(reply.text(), APOLOGY);
        let state = chat.snapshot().await.expect("open");
        assert_eq!(state.history().len(), 3);
        assert!(!state.is_awaiting_reply());
    }

    #[tokio::test]
    async fn malformed_reply_uses_fallback_text() {
        let chat = remote_session(Arc::new(FailingRuntime(GatewayError::MalformedReply {
            reason: "not json".to_string(),
        })));
        chat.open().await;

        let SendOutcome::Replied(reply) = chat.send("tuition").await else {
            panic!("expected a reply");
        };

        assert_eq!(reply.text(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn second_send_while_awaiting_is_rejected() {
        let gate = Arc::new(Notify::new());
        let chat = remote_session(Arc::new(GatedRuntime { gate: gate.clone() }));
        chat.open().await;

        let pending = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send("first").await }
        });
        wait_until_awaiting(&chat).await;

        assert_eq!(
            chat.send("second").await,
            SendOutcome::Rejected(Rejection::AwaitingReply)
        );
        assert_eq!(chat.snapshot().await.expect("open").history().len(), 2);

        gate.notify_one();
        let outcome = pending.await.expect("join");
        assert!(matches!(outcome, SendOutcome::Replied(ref m) if m.text() == "finally"));

        let state = chat.snapshot().await.expect("open");
        assert_eq!(state.history().len(), 3);
        assert!(alternates(state.history()));
        assert!(!state.is_awaiting_reply());
    }

    #[tokio::test]
    async fn closing_discards_reply_in_flight() {
        let gate = Arc::new(Notify::new());
        let chat = remote_session(Arc::new(GatedRuntime { gate: gate.clone() }));
        chat.open().await;

        let pending = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send("first").await }
        });
        wait_until_awaiting(&chat).await;

        chat.close().await;

        assert_eq!(pending.await.expect("join"), SendOutcome::Discarded);
        assert!(chat.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn dropped_send_still_completes_turn() {
        let gate = Arc::new(Notify::new());
        let chat = remote_session(Arc::new(GatedRuntime { gate: gate.clone() }));
        chat.open().await;

        let abandoned = tokio::time::timeout(Duration::from_millis(50), chat.send("hello")).await;
        assert!(abandoned.is_err());

        gate.notify_one();
        while chat
            .snapshot()
            .await
            .is_some_and(|state| state.is_awaiting_reply())
        {
            tokio::task::yield_now().await;
        }

        let state = chat.snapshot().await.expect("open");
        assert_eq!(state.history().len(), 3);
        assert_eq!(state.history()[2].text(), "finally");

        gate.notify_one();
        assert!(matches!(chat.send("again").await, SendOutcome::Replied(_)));
        assert_eq!(chat.snapshot().await.expect("open").history().len(), 5);
    }

    #[tokio::test]
    async fn suggestion_during_pending_turn_is_rejected() {
        let gate = Arc::new(Notify::new());
        let chat = remote_session(Arc::new(GatedRuntime { gate: gate.clone() }));
        chat.open().await;

        let pending = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send("first").await }
        });
        wait_until_awaiting(&chat).await;

        assert_eq!(
            chat.send_suggestion(0).await,
            SendOutcome::Rejected(Rejection::SuggestionsHidden)
        );
        assert_eq!(chat.snapshot().await.expect("open").history().len(), 2);

        gate.notify_one();
        assert!(matches!(pending.await.expect("join"), SendOutcome::Replied(_)));
    }

    #[tokio::test]
    async fn suggestion_sends_its_text_once() {
        let chat = local_session();
        chat.open().await;

        assert_eq!(
            chat.send_suggestion(9).await,
            SendOutcome::Rejected(Rejection::UnknownSuggestion)
        );

        let SendOutcome::Replied(reply) = chat.send_suggestion(0).await else {
            panic!("expected a reply");
        };
        let state = chat.snapshot().await.expect("open");
        assert_eq!(state.history()[1].text(), "Library hours");
        assert_eq!(reply.text(), state.history()[2].text());

        assert_eq!(
            chat.send_suggestion(1).await,
            SendOutcome::Rejected(Rejection::SuggestionsHidden)
        );
    }
}
