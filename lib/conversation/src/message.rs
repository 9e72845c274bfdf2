//! Message types for conversations.

use campus_desk_core::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The signed-in student.
    User,
    /// The assistant, local or remote.
    Bot,
}

/// A message in a conversation.
///
/// Messages are immutable once created; the text is stored verbatim and is
/// never interpreted as markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    text: String,
    sender: Sender,
    sent_at: DateTime<Utc>,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            sender,
            sent_at: Utc::now(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    /// Creates a bot message.
    #[must_use]
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    /// Returns the message id.
    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the message text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the author.
    #[must_use]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns when the message was created.
    #[must_use]
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }
}
