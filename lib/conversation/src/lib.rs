//! Chat conversation for the campus desk portal.
//!
//! This crate provides:
//!
//! - **Response resolver**: local keyword rules with documented precedence
//! - **Reply routing**: local resolver or remote bot gateway, per session
//! - **Chat session**: history, turn state and suggestions for one surface

pub mod message;
pub mod resolver;
pub mod route;
pub mod session;

pub use message::{Message, Sender};
pub use resolver::{Intent, Pattern, ResponseResolver};
pub use route::{Caller, ReplyRoute};
pub use session::{
    APOLOGY, ChatSession, ChatSettings, ConversationState, DEFAULT_SUGGESTIONS, GREETING,
    Rejection, SendOutcome, TurnPhase, alternates,
};
