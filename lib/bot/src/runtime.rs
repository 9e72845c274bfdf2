//! Bot runtime abstraction.
//!
//! Provides the interface to the managed conversational runtime and the
//! request/reply types exchanged with it.

use crate::error::GatewayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Locale used when none is configured.
pub const DEFAULT_LOCALE_ID: &str = "en_US";

fn default_locale_id() -> String {
    DEFAULT_LOCALE_ID.to_string()
}

/// Deployment configuration for a bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot identifier.
    pub bot_id: String,
    /// Alias of the bot version to talk to.
    pub bot_alias_id: String,
    /// Locale of the bot, e.g. `en_US`.
    #[serde(default = "default_locale_id")]
    pub locale_id: String,
    /// Region hosting the bot.
    pub region: String,
    /// Endpoint override, e.g. a signing proxy.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl BotConfig {
    /// Creates a configuration with the default locale and endpoint.
    #[must_use]
    pub fn new(
        bot_id: impl Into<String>,
        bot_alias_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            bot_id: bot_id.into(),
            bot_alias_id: bot_alias_id.into(),
            locale_id: default_locale_id(),
            region: region.into(),
            endpoint: None,
        }
    }

    /// Sets the locale.
    #[must_use]
    pub fn with_locale(mut self, locale_id: impl Into<String>) -> Self {
        self.locale_id = locale_id.into();
        self
    }

    /// Sets an endpoint override.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Returns the runtime endpoint, derived from the region unless
    /// overridden.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://runtime-v2-lex.{}.amazonaws.com", self.region))
    }
}

/// One utterance sent to the bot runtime.
#[derive(Clone, PartialEq, Eq)]
pub struct RecognizeTextRequest {
    /// Bot identifier.
    pub bot_id: String,
    /// Bot alias identifier.
    pub bot_alias_id: String,
    /// Bot locale.
    pub locale_id: String,
    /// Correlates turns of one conversation on the runtime.
    pub session_id: String,
    /// The raw user text.
    pub text: String,
    /// Attributes the bot can use to personalize replies.
    pub session_attributes: BTreeMap<String, String>,
    /// Bearer token forwarded to the endpoint, if any.
    pub bearer_token: Option<String>,
}

impl fmt::Debug for RecognizeTextRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognizeTextRequest")
            .field("bot_id", &self.bot_id)
            .field("bot_alias_id", &self.bot_alias_id)
            .field("locale_id", &self.locale_id)
            .field("session_id", &self.session_id)
            .field("text", &self.text)
            .field("session_attributes", &self.session_attributes)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// One piece of a bot reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyFragment {
    /// The fragment text.
    pub content: String,
    /// Content type reported by the runtime, e.g. `PlainText`.
    pub content_type: Option<String>,
}

impl ReplyFragment {
    /// Creates a plain-text fragment.
    #[must_use]
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: Some("PlainText".to_string()),
        }
    }
}

/// An ordered bot reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotReply {
    /// Reply fragments in display order.
    pub fragments: Vec<ReplyFragment>,
}

impl BotReply {
    /// Creates a reply from fragments.
    #[must_use]
    pub fn new(fragments: Vec<ReplyFragment>) -> Self {
        Self { fragments }
    }

    /// Joins the non-blank fragments with newlines.
    ///
    /// Returns `None` when no fragment carries text.
    #[must_use]
    pub fn joined_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .fragments
            .iter()
            .map(|fragment| fragment.content.as_str())
            .filter(|content| !content.trim().is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

/// Trait for bot runtimes.
///
/// Implementations report transport problems as
/// [`GatewayError::UpstreamUnavailable`] and unreadable replies as
/// [`GatewayError::MalformedReply`].
#[async_trait]
pub trait BotRuntime: Send + Sync {
    /// Sends one utterance and returns the bot's reply.
    async fn recognize_text(
        &self,
        request: &RecognizeTextRequest,
    ) -> campus_desk_core::Result<BotReply, GatewayError>;

    /// Returns a short name for logging.
    fn name(&self) -> &str;
}
