//! Typed ID wrappers for conversations, messages, and stream attempts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up conversation IDs, message IDs, and
/// stream identities. They are plain strings underneath — `generate()`
/// produces a UUID v4, but callers may supply any format they like.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random ID.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(ConversationId, "Unique identifier for a conversation.");
typed_id!(MessageId, "Unique identifier for a message.");
typed_id!(
    StreamId,
    "Identity of one stream attempt. A conversation's current stream identity \
     changes when a newer send supersedes it; stale attempts compare their \
     own identity against it and stand down."
);
