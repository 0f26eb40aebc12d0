//! The transport seam: request types, stream events, and the
//! [`ChatTransport`] trait a chat backend implements.

use std::future::Future;
use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::message::{Message, Role};

/// Wire-level author role for chat requests.
///
/// Unlike [`Role`], request transcripts may carry a leading system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System prompt entry.
    System,
    /// User turn.
    User,
    /// Assistant turn.
    Assistant,
}

impl From<Role> for ChatRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        }
    }
}

/// One entry in a request transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Wire-level role.
    pub role: ChatRole,
    /// Plain text content.
    pub content: String,
}

impl ChatMessage {
    /// Create a transcript entry.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.into(),
            content: msg.content.clone(),
        }
    }
}

/// Sampling parameters forwarded verbatim to the model server.
///
/// Every field is optional and omitted from the wire when unset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Penalty applied to repeated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
}

/// A streaming chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier, e.g. `llama3.2`.
    pub model: String,
    /// Ordered transcript, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Sampling parameters, if the caller wants any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,
}

impl ChatRequest {
    /// Create a request for `model` with the given transcript.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
        }
    }

    /// Attach sampling parameters.
    #[must_use]
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// An installed model as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name, e.g. `llama3.2:latest`.
    pub name: String,
    /// On-disk size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Content digest.
    #[serde(default)]
    pub digest: String,
    /// Last-modified timestamp as reported by the server.
    #[serde(default)]
    pub modified_at: String,
}

/// Token counters reported by the terminal record of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub input_tokens: u64,
    /// Tokens generated for the reply.
    pub output_tokens: u64,
}

/// An event emitted while an assistant reply streams in.
///
/// A well-formed stream is zero or more `Delta`s followed by exactly one
/// terminal event (`Completed` or `Failed`), after which nothing follows.
#[derive(Debug)]
pub enum ChatEvent {
    /// One text increment, in arrival order.
    Delta(String),
    /// The reply finished: the server sent its done marker or the input
    /// ended. Carries token counters when the terminal record had them.
    Completed(Option<TokenUsage>),
    /// The stream failed mid-flight.
    Failed(TransportError),
}

/// Handle to an in-flight chat reply.
pub struct ChatStream {
    /// The decoded event stream. Consume with `StreamExt::next()`.
    pub events: Pin<Box<dyn Stream<Item = ChatEvent> + Send>>,
}

impl ChatStream {
    /// Wrap an event stream.
    pub fn new(events: impl Stream<Item = ChatEvent> + Send + 'static) -> Self {
        Self {
            events: Box::pin(events),
        }
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream").finish_non_exhaustive()
    }
}

/// A chat backend: opens streaming completions, answers a reachability
/// probe, and lists installed models.
///
/// Methods return `impl Future` (RPITIT), which makes the trait not
/// object-safe; take a generic `<T: ChatTransport>` rather than
/// `dyn ChatTransport`.
pub trait ChatTransport: Send + Sync {
    /// Open a streaming chat completion.
    fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ChatStream, TransportError>> + Send;

    /// Cheap reachability probe. `true` iff the server answered.
    fn check_connection(&self) -> impl Future<Output = bool> + Send;

    /// List the models installed on the server.
    fn list_models(&self) -> impl Future<Output = Result<Vec<ModelInfo>, TransportError>> + Send;
}
