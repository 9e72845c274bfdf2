//! Remote bot delegate for the campus desk chat.
//!
//! This crate provides:
//!
//! - **Bot runtime**: the `BotRuntime` seam and its wire types, plus an
//!   HTTP client for the managed text runtime
//! - **Conversation gateway**: turns one user utterance and the caller's
//!   identity into a runtime request and normalizes the reply into plain text
//!
//! The gateway keeps no state between calls; multi-turn context lives with
//! the remote runtime, keyed by the session key.

pub mod error;
pub mod gateway;
pub mod http;
pub mod runtime;

pub use error::GatewayError;
pub use gateway::{ConversationGateway, DEFAULT_REPLY_TIMEOUT, FALLBACK_REPLY};
pub use http::HttpBotRuntime;
pub use runtime::{BotConfig, BotReply, BotRuntime, RecognizeTextRequest, ReplyFragment};
