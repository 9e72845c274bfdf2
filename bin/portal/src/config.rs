//! Centralized portal configuration.
//!
//! Loaded via the `config` crate from environment variables, using `__` to
//! separate sections from keys (`BOT__BOT_ID`, `CHAT__SHOW_SUGGESTIONS`).
//!
//! Both the identity and bot sections are optional. Without an identity
//! section the offline provider is used; without a bot section the chat
//! answers from the local resolver.

use crate::error::PortalError;
use campus_desk_bot::BotConfig;
use campus_desk_conversation::ChatSettings;
use campus_desk_platform_access::IdentityConfig;
use rootcause::Report;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Portal configuration composed from library configs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortalConfig {
    /// User pool configuration.
    #[serde(default)]
    pub identity: Option<IdentityConfig>,

    /// Bot runtime configuration.
    #[serde(default)]
    pub bot: Option<BotConfig>,

    /// Chat surface configuration.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Chat-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatConfig {
    /// Whether suggestions are shown when the chat opens.
    #[serde(default = "default_show_suggestions")]
    pub show_suggestions: bool,

    /// Seconds to wait for the bot runtime before apologizing.
    #[serde(default = "default_reply_timeout_seconds")]
    pub reply_timeout_seconds: u64,

    /// Comma-separated suggestion texts; the built-in list when unset.
    #[serde(default)]
    pub suggestions: Option<String>,
}

fn default_show_suggestions() -> bool {
    true
}

fn default_reply_timeout_seconds() -> u64 {
    12
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            show_suggestions: default_show_suggestions(),
            reply_timeout_seconds: default_reply_timeout_seconds(),
            suggestions: None,
        }
    }
}

impl ChatConfig {
    /// Returns the reply timeout.
    #[must_use]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_seconds)
    }

    /// Builds the chat session settings.
    #[must_use]
    pub fn settings(&self) -> ChatSettings {
        let mut settings = ChatSettings {
            show_suggestions: self.show_suggestions,
            ..ChatSettings::default()
        };
        if let Some(list) = &self.suggestions {
            settings.suggestions = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        settings
    }
}

impl PortalConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a present section is incomplete or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, Report<PortalError>> {
        Self::load(None)
    }

    /// Loads configuration from an explicit variable map instead of the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a present section is incomplete or a value
    /// cannot be parsed.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, Report<PortalError>> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self, Report<PortalError>> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(|e| {
                PortalError::Config {
                    reason: e.to_string(),
                }
                .into()
            })
    }
}
