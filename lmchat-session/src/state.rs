//! Session state behind the lock: the conversation list, connectivity and
//! model selection, and the stream bindings that tie each conversation to
//! its one in-flight reply.

use std::collections::HashMap;

use chrono::Utc;
use lmchat_types::{Conversation, ConversationId, Message, MessageId, StreamId};

/// Longest derived title, in characters.
const TITLE_MAX_CHARS: usize = 50;

/// Ties a conversation to its one in-flight stream attempt.
#[derive(Debug, Clone)]
pub(crate) struct StreamBinding {
    /// Identity of the attempt that owns the placeholder.
    pub stream: StreamId,
    /// The assistant placeholder being filled.
    pub message: MessageId,
}

/// What a stream attempt found when it tried to touch its conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applied {
    /// The attempt still owns the binding; the mutation went through.
    Current,
    /// A newer attempt owns the conversation now.
    Superseded,
    /// The conversation no longer exists.
    Gone,
}

/// Mutable session state. One lock guards all of it; every mutation window
/// is synchronous.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    /// Conversations, newest first.
    pub conversations: Vec<Conversation>,
    /// The active conversation, if any.
    pub active: Option<ConversationId>,
    /// Result of the last connectivity probe. Sends are rejected until a
    /// probe has succeeded.
    pub connected: bool,
    /// Installed model names from the last refresh.
    pub models: Vec<String>,
    /// Model used for new requests.
    pub selected_model: Option<String>,
    /// In-flight stream per conversation. A message is streaming iff a
    /// binding points at it.
    pub bindings: HashMap<ConversationId, StreamBinding>,
}

impl SessionState {
    pub fn conversation(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn conversation_mut(&mut self, id: &ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| &c.id == id)
    }

    /// Append a message. The first message ever appended also sets the
    /// title; `updated_at` bumps on every append. Unknown ids are ignored.
    pub fn append_message(&mut self, id: &ConversationId, message: Message) {
        let Some(conv) = self.conversation_mut(id) else {
            return;
        };
        if conv.messages.is_empty() {
            conv.title = derive_title(&message.content);
        }
        conv.messages.push(message);
        conv.updated_at = Utc::now();
    }

    /// Detach any in-flight stream from `id`. The bound placeholder keeps
    /// the partial content it has accumulated; only its streaming flag
    /// clears. The detached attempt notices on its next write and stops.
    pub fn supersede_binding(&mut self, id: &ConversationId) {
        let Some(binding) = self.bindings.remove(id) else {
            return;
        };
        if let Some(conv) = self.conversation_mut(id) {
            if let Some(msg) = conv.messages.iter_mut().find(|m| m.id == binding.message) {
                msg.streaming = false;
            }
            conv.updated_at = Utc::now();
        }
    }

    /// Apply `f` to the bound placeholder iff `stream` still owns the
    /// binding for `id`.
    pub fn apply_to_stream(
        &mut self,
        id: &ConversationId,
        stream: &StreamId,
        f: impl FnOnce(&mut Message),
    ) -> Applied {
        if self.conversation(id).is_none() {
            return Applied::Gone;
        }
        let message_id = match self.bindings.get(id) {
            Some(binding) if &binding.stream == stream => binding.message.clone(),
            _ => return Applied::Superseded,
        };
        if let Some(conv) = self.conversation_mut(id) {
            if let Some(msg) = conv.messages.iter_mut().find(|m| m.id == message_id) {
                f(msg);
            }
            conv.updated_at = Utc::now();
        }
        Applied::Current
    }

    /// Terminal variant of [`apply_to_stream`](Self::apply_to_stream):
    /// applies `f` and drops the binding, returning the conversation to
    /// idle.
    pub fn finish_stream(
        &mut self,
        id: &ConversationId,
        stream: &StreamId,
        f: impl FnOnce(&mut Message),
    ) -> Applied {
        let applied = self.apply_to_stream(id, stream, f);
        if applied == Applied::Current {
            self.bindings.remove(id);
        }
        applied
    }
}

/// Derive a conversation title from its first message: the first
/// [`TITLE_MAX_CHARS`] characters, with `...` appended when the message
/// runs longer. Counted in characters so multi-byte text never splits.
pub(crate) fn derive_title(content: &str) -> String {
    let mut title: String = content.chars().take(TITLE_MAX_CHARS).collect();
    if content.chars().nth(TITLE_MAX_CHARS).is_some() {
        title.push_str("...");
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_conversation() -> (SessionState, ConversationId) {
        let mut state = SessionState::default();
        let conv = Conversation::new();
        let id = conv.id.clone();
        state.conversations.push(conv);
        (state, id)
    }

    fn bind(state: &mut SessionState, id: &ConversationId) -> (StreamId, MessageId) {
        let placeholder = Message::assistant_placeholder();
        let stream = StreamId::generate();
        state.bindings.insert(
            id.clone(),
            StreamBinding {
                stream: stream.clone(),
                message: placeholder.id.clone(),
            },
        );
        let message_id = placeholder.id.clone();
        state.append_message(id, placeholder);
        (stream, message_id)
    }

    #[test]
    fn short_titles_are_kept_verbatim() {
        assert_eq!(derive_title("Hello there"), "Hello there");
    }

    #[test]
    fn exactly_fifty_characters_is_not_truncated() {
        let content = "a".repeat(50);
        assert_eq!(derive_title(&content), content);
    }

    #[test]
    fn long_titles_are_truncated_with_ellipsis() {
        let content = "a".repeat(60);
        let title = derive_title(&content);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let content = "ü".repeat(60);
        let title = derive_title(&content);
        assert_eq!(title, format!("{}...", "ü".repeat(50)));
    }

    #[test]
    fn first_append_sets_the_title_once() {
        let (mut state, id) = state_with_conversation();
        state.append_message(&id, Message::user("What is the answer to everything?"));
        state.append_message(&id, Message::user("Second message changes nothing"));
        let conv = state.conversation(&id).unwrap();
        assert_eq!(conv.title, "What is the answer to everything?");
    }

    #[test]
    fn append_to_unknown_conversation_is_a_noop() {
        let mut state = SessionState::default();
        state.append_message(&ConversationId::new("missing"), Message::user("hi"));
        assert!(state.conversations.is_empty());
    }

    #[test]
    fn supersede_clears_the_flag_and_keeps_partial_content() {
        let (mut state, id) = state_with_conversation();
        let (stream, message_id) = bind(&mut state, &id);
        state.apply_to_stream(&id, &stream, |msg| msg.content = "partial".into());

        state.supersede_binding(&id);

        let conv = state.conversation(&id).unwrap();
        let msg = conv.message(&message_id).unwrap();
        assert_eq!(msg.content, "partial");
        assert!(!msg.streaming);
        assert!(state.bindings.get(&id).is_none());
    }

    #[test]
    fn apply_with_current_identity_mutates() {
        let (mut state, id) = state_with_conversation();
        let (stream, message_id) = bind(&mut state, &id);

        let applied = state.apply_to_stream(&id, &stream, |msg| msg.content = "hi".into());
        assert_eq!(applied, Applied::Current);
        assert_eq!(
            state.conversation(&id).unwrap().message(&message_id).unwrap().content,
            "hi"
        );
    }

    #[test]
    fn apply_with_stale_identity_is_superseded() {
        let (mut state, id) = state_with_conversation();
        let (_stream, message_id) = bind(&mut state, &id);

        let stale = StreamId::generate();
        let applied = state.apply_to_stream(&id, &stale, |msg| msg.content = "late".into());
        assert_eq!(applied, Applied::Superseded);
        assert!(
            state.conversation(&id).unwrap().message(&message_id).unwrap().content.is_empty(),
            "stale write must not land"
        );
    }

    #[test]
    fn apply_to_deleted_conversation_is_gone() {
        let (mut state, id) = state_with_conversation();
        let (stream, _) = bind(&mut state, &id);
        state.conversations.retain(|c| c.id != id);
        state.bindings.remove(&id);

        let applied = state.apply_to_stream(&id, &stream, |msg| msg.content = "late".into());
        assert_eq!(applied, Applied::Gone);
    }

    #[test]
    fn finish_drops_the_binding() {
        let (mut state, id) = state_with_conversation();
        let (stream, message_id) = bind(&mut state, &id);

        let applied = state.finish_stream(&id, &stream, |msg| msg.streaming = false);
        assert_eq!(applied, Applied::Current);
        assert!(state.bindings.get(&id).is_none());
        assert!(!state.conversation(&id).unwrap().message(&message_id).unwrap().streaming);
    }

    #[test]
    fn finish_with_stale_identity_leaves_the_binding() {
        let (mut state, id) = state_with_conversation();
        let (_stream, _) = bind(&mut state, &id);

        let stale = StreamId::generate();
        let applied = state.finish_stream(&id, &stale, |msg| msg.streaming = false);
        assert_eq!(applied, Applied::Superseded);
        assert!(state.bindings.get(&id).is_some(), "current binding survives");
    }
}
