//! Core types and utilities for the campus-desk student portal.
//!
//! This crate provides the typed identifiers and the error handling
//! foundation shared by the identity, bot, and conversation crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ConversationId, MessageId, ParseIdError, RequestId};
