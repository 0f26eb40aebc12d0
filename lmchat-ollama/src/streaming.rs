//! NDJSON stream decoding for the Ollama Chat API.
//!
//! Ollama streams one JSON record per line rather than SSE:
//!
//! ```text
//! {"model":"llama3.2","message":{"role":"assistant","content":"Hello"},"done":false}
//! {"model":"llama3.2","message":{"role":"assistant","content":" world"},"done":false}
//! {"model":"llama3.2","message":{"role":"assistant","content":""},"done":true,"done_reason":"stop","eval_count":10,"prompt_eval_count":20}
//! ```
//!
//! [`decode_chat_stream`] re-assembles those records across arbitrary
//! byte-chunk boundaries and maps them to [`ChatEvent`]s.
//!
//! Reference: <https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion>

use bytes::BytesMut;
use futures::{Stream, StreamExt};
use lmchat_types::{ChatEvent, ChatStream, TransportError};

use crate::error::map_reqwest_error;
use crate::wire::ChatChunk;

/// Wrap an HTTP response body into a [`ChatStream`].
pub(crate) fn stream_from_response(response: reqwest::Response) -> ChatStream {
    let chunks = response
        .bytes_stream()
        .map(|chunk| chunk.map_err(map_reqwest_error));
    ChatStream::new(decode_chat_stream(chunks))
}

/// Decode a fallible byte-chunk stream into [`ChatEvent`]s.
///
/// One decoder serves exactly one stream attempt. The output is zero or
/// more `Delta`s followed by exactly one terminal event:
///
/// - a record with `done: true` completes the stream immediately; its own
///   content, if any, is emitted first, and anything buffered after it is
///   dropped;
/// - end of input without a done marker is normal completion, after a
///   final unterminated line (if any) is decoded;
/// - a chunk-level error fails the stream.
///
/// Buffering is in bytes, not text, so a chunk boundary may fall inside a
/// multi-byte UTF-8 character; re-chunking the same bytes never changes
/// the decoded events. Lines that do not parse as a chat record are
/// skipped and decoding continues with the next line.
pub fn decode_chat_stream(
    chunks: impl Stream<Item = Result<bytes::Bytes, TransportError>> + Send + 'static,
) -> impl Stream<Item = ChatEvent> + Send + 'static {
    async_stream::stream! {
        let mut chunks = std::pin::pin!(chunks);
        let mut buf = BytesMut::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield ChatEvent::Failed(e);
                    return;
                }
            };
            buf.extend_from_slice(&chunk);

            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let line = buf.split_to(pos + 1);
                let Some(record) = decode_line(&line[..pos]) else {
                    continue;
                };

                let usage = record.usage();
                if let Some(message) = record.message
                    && !message.content.is_empty()
                {
                    yield ChatEvent::Delta(message.content);
                }
                if record.done {
                    yield ChatEvent::Completed(usage);
                    return;
                }
            }
        }

        // Well-behaved producers terminate every record, but a final line
        // without a newline still decodes like any other.
        if let Some(record) = decode_line(&buf) {
            let usage = record.usage();
            if let Some(message) = record.message
                && !message.content.is_empty()
            {
                yield ChatEvent::Delta(message.content);
            }
            if record.done {
                yield ChatEvent::Completed(usage);
                return;
            }
        }

        yield ChatEvent::Completed(None);
    }
}

/// Decode one line into a chat record.
///
/// Returns `None` for blank lines and for anything that does not parse as
/// a record (invalid UTF-8, invalid JSON, non-object JSON). Decoding a
/// stream never fails on a bad line; it is skipped.
fn decode_line(line: &[u8]) -> Option<ChatChunk> {
    let line = match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    };
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            tracing::debug!(error = %e, "skipping undecodable stream line");
            return None;
        }
    };
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed stream line");
            None
        }
    }
}
