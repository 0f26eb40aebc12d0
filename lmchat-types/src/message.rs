//! Conversation data model: roles, messages, conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ConversationId, MessageId};

/// Author of a stored message.
///
/// Stored history carries exactly these two roles. System prompts are a
/// wire-level concern ([`ChatRole`](crate::transport::ChatRole)) and never
/// appear in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sent by the person driving the conversation.
    User,
    /// Produced by the model.
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id.
    pub id: MessageId,
    /// Who authored the message.
    pub role: Role,
    /// Full text content. While streaming, the accumulated prefix received
    /// so far; afterwards, the complete reply (or the failure notice).
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// True while an assistant reply is still being streamed into this
    /// message. At most one message per conversation has this set.
    #[serde(default)]
    pub streaming: bool,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
            streaming: false,
        }
    }

    /// Create a completed assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
            streaming: false,
        }
    }

    /// Create an empty assistant message that an in-flight stream will fill.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::Assistant,
            content: String::new(),
            created_at: Utc::now(),
            streaming: true,
        }
    }
}

/// A conversation: an ordered, append-only list of messages plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique id.
    pub id: ConversationId,
    /// Display title. Starts as [`Conversation::PLACEHOLDER_TITLE`] and is
    /// derived once from the first message appended.
    pub title: String,
    /// Messages in append order. Never reordered, never inserted into.
    pub messages: Vec<Message>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Bumped on every append and on every content mutation.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Title given to a conversation before its first message arrives.
    pub const PLACEHOLDER_TITLE: &'static str = "New Conversation";

    /// Create an empty conversation with a generated id.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::generate(),
            title: Self::PLACEHOLDER_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a message by id.
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// The message currently being streamed into, if any.
    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.streaming)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
