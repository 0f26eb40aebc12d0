//! Wire format of the Ollama HTTP API.
//!
//! Reference: <https://github.com/ollama/ollama/blob/main/docs/api.md>

use lmchat_types::{ChatMessage, GenerationOptions, ModelInfo, TokenUsage};
use serde::{Deserialize, Serialize};

/// JSON body for `POST /api/chat`.
#[derive(Debug, Serialize)]
pub(crate) struct ChatBody<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    /// Reasoning traces are never requested; replies carry answer text only.
    pub think: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,
}

/// One NDJSON record of a streaming chat response.
///
/// Progress records carry `message.content`; the terminal record carries
/// `done: true` plus eval counters. Every field is optional so a record
/// with neither is simply a no-op.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChunkMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

/// The `message` object inside a [`ChatChunk`].
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChunkMessage {
    #[serde(default)]
    pub content: String,
}

impl ChatChunk {
    /// Token counters, when the record carried any.
    pub fn usage(&self) -> Option<TokenUsage> {
        if self.prompt_eval_count.is_none() && self.eval_count.is_none() {
            return None;
        }
        Some(TokenUsage {
            input_tokens: self.prompt_eval_count.unwrap_or(0),
            output_tokens: self.eval_count.unwrap_or(0),
        })
    }
}

/// JSON body of `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}
