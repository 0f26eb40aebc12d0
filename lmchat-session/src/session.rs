//! Core ChatSession struct and its operations.

use futures::StreamExt;
use lmchat_types::{
    ChatEvent, ChatMessage, ChatRequest, ChatStream, ChatTransport, Conversation, ConversationId,
    Message, SendError, StreamId, TransportError,
};
use tokio::sync::RwLock;

use crate::state::{Applied, SessionState, StreamBinding};

/// Fixed content written into the placeholder when a reply fails. This is
/// the one sanctioned case of a streaming message's content shrinking.
pub const FAILURE_NOTICE: &str =
    "Sorry, I encountered an error. Please make sure the model server is running and try again.";

/// How a send ended.
///
/// These are the terminal states of the per-conversation stream state
/// machine. Precondition rejections are not outcomes; they come back as
/// [`SendError`] before anything changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The reply finished normally. Also reported when the conversation
    /// was deleted mid-stream and the rest of the reply went nowhere.
    Completed,
    /// The transport failed; the placeholder holds [`FAILURE_NOTICE`].
    Failed,
    /// A newer send took the conversation over; the placeholder keeps the
    /// partial content it had accumulated.
    Superseded,
}

/// Conversation store and streaming state machine over a [`ChatTransport`].
///
/// All methods take `&self`; wrap the session in an `Arc` to share it
/// across tasks. The single lock is only ever held for synchronous
/// mutation windows, never across an await, so different conversations
/// stream concurrently and readers always observe whole messages.
///
/// # Example
///
/// ```no_run
/// use lmchat_session::ChatSession;
/// use lmchat_ollama::Ollama;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let session = ChatSession::new(Ollama::new());
/// session.check_connection().await;
/// session.refresh_models().await?;
/// let conversation = session.create_conversation().await;
/// session.send(&conversation, "Why is the sky blue?").await?;
/// # Ok(())
/// # }
/// ```
pub struct ChatSession<T: ChatTransport> {
    transport: T,
    state: RwLock<SessionState>,
}

impl<T: ChatTransport> ChatSession<T> {
    /// Create a session over `transport`. No conversations, no model
    /// selected, not yet connected.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: RwLock::new(SessionState::default()),
        }
    }

    // --- Connectivity and models ---

    /// Probe the server and record the result as the send gate.
    ///
    /// Until a probe succeeds, [`send`](Self::send) rejects with
    /// [`SendError::NotConnected`].
    pub async fn check_connection(&self) -> bool {
        let connected = self.transport.check_connection().await;
        self.state.write().await.connected = connected;
        tracing::debug!(connected, "connectivity probe recorded");
        connected
    }

    /// Fetch installed models and remember their names. When no model is
    /// selected yet, the first listed one becomes the selection.
    pub async fn refresh_models(&self) -> Result<Vec<String>, TransportError> {
        let models = self.transport.list_models().await?;
        let names: Vec<String> = models.into_iter().map(|m| m.name).collect();

        let mut state = self.state.write().await;
        if state.selected_model.is_none()
            && let Some(first) = names.first()
        {
            tracing::debug!(model = %first, "selecting default model");
            state.selected_model = Some(first.clone());
        }
        state.models = names.clone();
        Ok(names)
    }

    /// Select the model used for new requests. Availability is not
    /// validated.
    pub async fn select_model(&self, model: impl Into<String>) {
        self.state.write().await.selected_model = Some(model.into());
    }

    // --- Conversation management ---

    /// Create an empty conversation, insert it at the front of the list,
    /// and make it active.
    pub async fn create_conversation(&self) -> ConversationId {
        let conv = Conversation::new();
        let id = conv.id.clone();

        let mut state = self.state.write().await;
        state.conversations.insert(0, conv);
        state.active = Some(id.clone());
        tracing::debug!(conversation = %id, "created conversation");
        id
    }

    /// Delete a conversation. Unknown ids are a no-op. If the deleted
    /// conversation was active, activation falls to the front of the list
    /// or to none. An in-flight reply for it keeps running but its
    /// remaining increments go nowhere.
    pub async fn delete_conversation(&self, id: &ConversationId) {
        let mut state = self.state.write().await;
        let before = state.conversations.len();
        state.conversations.retain(|c| &c.id != id);
        if state.conversations.len() == before {
            return;
        }
        state.bindings.remove(id);
        if state.active.as_ref() == Some(id) {
            state.active = state.conversations.first().map(|c| c.id.clone());
        }
        tracing::debug!(conversation = %id, "deleted conversation");
    }

    /// Make a conversation active. Returns `false` (and changes nothing)
    /// for an unknown id.
    pub async fn select_conversation(&self, id: &ConversationId) -> bool {
        let mut state = self.state.write().await;
        if state.conversation(id).is_none() {
            return false;
        }
        state.active = Some(id.clone());
        true
    }

    /// Remove every conversation, binding, and the active id.
    pub async fn clear_conversations(&self) {
        let mut state = self.state.write().await;
        state.conversations.clear();
        state.bindings.clear();
        state.active = None;
    }

    // --- Accessors (cloned snapshots under the read lock) ---

    /// All conversations, newest first.
    pub async fn conversations(&self) -> Vec<Conversation> {
        self.state.read().await.conversations.clone()
    }

    /// One conversation by id.
    pub async fn conversation(&self, id: &ConversationId) -> Option<Conversation> {
        self.state.read().await.conversation(id).cloned()
    }

    /// The active conversation id, if any.
    pub async fn active_conversation(&self) -> Option<ConversationId> {
        self.state.read().await.active.clone()
    }

    /// Whether a reply is currently streaming into this conversation.
    pub async fn is_streaming(&self, id: &ConversationId) -> bool {
        self.state.read().await.bindings.contains_key(id)
    }

    /// Installed model names from the last refresh.
    pub async fn models(&self) -> Vec<String> {
        self.state.read().await.models.clone()
    }

    /// The currently selected model, if any.
    pub async fn selected_model(&self) -> Option<String> {
        self.state.read().await.selected_model.clone()
    }

    /// Result of the last connectivity probe.
    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    // --- Send ---

    /// Send `text` into a conversation and drive the streamed reply to a
    /// terminal state.
    ///
    /// Rejects with a [`SendError`] before touching anything when the
    /// trimmed text is empty, the conversation is unknown, no model is
    /// selected, or no connectivity probe has succeeded.
    ///
    /// Otherwise, in one atomic window: any reply already streaming into
    /// the conversation is superseded (its partial content stays, its
    /// flag clears), the user message is appended (deriving the title on
    /// a first message), and an assistant placeholder is bound to a fresh
    /// stream identity. The request carries the history up to and
    /// including the user message — not the placeholder.
    ///
    /// Each delta replaces the placeholder content with everything
    /// accumulated so far, so observers never see a partially-applied
    /// increment. The call returns when the reply completes, fails (the
    /// placeholder then holds [`FAILURE_NOTICE`]), is superseded, or its
    /// conversation disappears.
    pub async fn send(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<SendOutcome, SendError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendError::EmptyPrompt);
        }

        let (stream_id, model, history) = {
            let mut state = self.state.write().await;
            if state.conversation(conversation).is_none() {
                return Err(SendError::UnknownConversation(conversation.clone()));
            }
            let Some(model) = state.selected_model.clone() else {
                return Err(SendError::NoModelConfigured);
            };
            if !state.connected {
                return Err(SendError::NotConnected);
            }

            state.supersede_binding(conversation);
            state.append_message(conversation, Message::user(text));

            let history: Vec<ChatMessage> = state
                .conversation(conversation)
                .map(|conv| conv.messages.iter().map(ChatMessage::from).collect())
                .unwrap_or_default();

            let placeholder = Message::assistant_placeholder();
            let stream_id = StreamId::generate();
            state.bindings.insert(
                conversation.clone(),
                StreamBinding {
                    stream: stream_id.clone(),
                    message: placeholder.id.clone(),
                },
            );
            state.append_message(conversation, placeholder);

            (stream_id, model, history)
        };

        tracing::debug!(conversation = %conversation, model = %model, "starting chat stream");

        let request = ChatRequest::new(model, history);
        match self.transport.stream_chat(request).await {
            Ok(stream) => Ok(self.consume_stream(conversation, &stream_id, stream).await),
            Err(e) => {
                tracing::warn!(conversation = %conversation, error = %e, "chat stream failed to open");
                Ok(self.fail_stream(conversation, &stream_id).await)
            }
        }
    }

    /// Fold decoded events into the bound placeholder until a terminal
    /// event, supersession, or deletion stops the attempt.
    async fn consume_stream(
        &self,
        conversation: &ConversationId,
        stream_id: &StreamId,
        stream: ChatStream,
    ) -> SendOutcome {
        let mut events = stream.events;
        let mut accumulated = String::new();

        while let Some(event) = events.next().await {
            match event {
                ChatEvent::Delta(text) => {
                    accumulated.push_str(&text);
                    let full = accumulated.clone();
                    let applied = self
                        .state
                        .write()
                        .await
                        .apply_to_stream(conversation, stream_id, move |msg| {
                            msg.content = full;
                        });
                    match applied {
                        Applied::Current => {}
                        Applied::Superseded => {
                            tracing::debug!(conversation = %conversation, "superseded; discarding the rest of the reply");
                            return SendOutcome::Superseded;
                        }
                        Applied::Gone => {
                            tracing::debug!(conversation = %conversation, "conversation deleted; discarding the rest of the reply");
                            return SendOutcome::Completed;
                        }
                    }
                }
                ChatEvent::Completed(usage) => {
                    if let Some(usage) = usage {
                        tracing::debug!(
                            conversation = %conversation,
                            input_tokens = usage.input_tokens,
                            output_tokens = usage.output_tokens,
                            "stream completed"
                        );
                    }
                    return self.complete_stream(conversation, stream_id).await;
                }
                ChatEvent::Failed(e) => {
                    tracing::warn!(conversation = %conversation, error = %e, "stream failed");
                    return self.fail_stream(conversation, stream_id).await;
                }
            }
        }

        // Decoders end with a terminal event; a bare end of events still
        // finalizes like a completion.
        self.complete_stream(conversation, stream_id).await
    }

    async fn complete_stream(
        &self,
        conversation: &ConversationId,
        stream_id: &StreamId,
    ) -> SendOutcome {
        let applied = self
            .state
            .write()
            .await
            .finish_stream(conversation, stream_id, |msg| {
                msg.streaming = false;
            });
        match applied {
            Applied::Current | Applied::Gone => SendOutcome::Completed,
            Applied::Superseded => SendOutcome::Superseded,
        }
    }

    async fn fail_stream(
        &self,
        conversation: &ConversationId,
        stream_id: &StreamId,
    ) -> SendOutcome {
        let applied = self
            .state
            .write()
            .await
            .finish_stream(conversation, stream_id, |msg| {
                msg.content = FAILURE_NOTICE.to_string();
                msg.streaming = false;
            });
        match applied {
            Applied::Current => SendOutcome::Failed,
            Applied::Superseded => SendOutcome::Superseded,
            Applied::Gone => SendOutcome::Completed,
        }
    }
}
