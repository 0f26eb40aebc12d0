#![deny(missing_docs)]
//! Ollama chat transport for lmchat.
//!
//! This crate implements the [`ChatTransport`] trait from `lmchat-types`
//! against the [Ollama HTTP API](https://github.com/ollama/ollama/blob/main/docs/api.md):
//!
//! - streaming chat completions (`POST /api/chat`, NDJSON)
//! - the reachability probe (`GET /api/version`)
//! - installed-model listing (`GET /api/tags`)
//!
//! # Usage
//!
//! ```no_run
//! use lmchat_ollama::Ollama;
//!
//! let transport = Ollama::new().base_url("http://localhost:11434");
//! ```
//!
//! Ollama streams newline-delimited JSON rather than SSE; the decoder in
//! [`streaming`] re-assembles records across arbitrary byte-chunk
//! boundaries, so it can also be fed directly for testing.

pub mod client;
pub mod error;
pub mod streaming;
pub mod wire;

pub use client::Ollama;
pub use streaming::decode_chat_stream;

// Re-export lmchat-types for convenience
pub use lmchat_types::{ChatEvent, ChatStream, ChatTransport, TransportError};
