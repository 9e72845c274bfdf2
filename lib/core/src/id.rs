//! Strongly-typed ID types.
//!
//! Ids wrap a ULID, so they sort by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Declares a ULID newtype displayed as `<prefix>_<ulid>`.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Mints a fresh id.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ulid::from_str(raw)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Unique identifier for a chat message.
    MessageId,
    "msg"
);

define_id!(
    /// Unique identifier for one open chat surface.
    ///
    /// A new id is minted every time the surface opens, so replies that
    /// arrive for an earlier surface can be told apart and dropped.
    ConversationId,
    "conv"
);

define_id!(
    /// Unique identifier for a single bot runtime request.
    RequestId,
    "req"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_display_format() {
        let id = MessageId::new();
        assert!(id.to_string().starts_with("msg_"));
    }

    #[test]
    fn conversation_id_display_format() {
        let id = ConversationId::new();
        assert!(id.to_string().starts_with("conv_"));
    }

    #[test]
    fn parse_with_prefix() {
        let id = RequestId::new();
        let parsed: RequestId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_without_prefix() {
        let ulid = Ulid::new();
        let id: MessageId = ulid.to_string().parse().expect("should parse");
        assert_eq!(id.to_string(), format!("msg_{ulid}"));
    }

    #[test]
    fn parse_invalid_ulid() {
        let err = "not_a_ulid".parse::<ConversationId>().unwrap_err();
        assert_eq!(err.id_type, "ConversationId");
    }

    #[test]
    fn ids_are_unique() {
        use std::collections::HashSet;

        let ids: HashSet<MessageId> = (0..64).map(|_| MessageId::new()).collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = MessageId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        let parsed: MessageId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, parsed);
    }
}
