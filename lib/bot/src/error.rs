//! Error types for the bot crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `GatewayError`: failures reaching the bot runtime or reading its reply

use std::fmt;

/// Errors from bot runtime operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The runtime could not be reached, timed out, or answered with an
    /// error status.
    UpstreamUnavailable { reason: String },
    /// A reply arrived but could not be interpreted.
    MalformedReply { reason: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamUnavailable { reason } => {
                write!(f, "bot runtime unavailable: {reason}")
            }
            Self::MalformedReply { reason } => {
                write!(f, "malformed bot reply: {reason}")
            }
        }
    }
}

impl std::error::Error for GatewayError {}
