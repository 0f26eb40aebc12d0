//! # lmchat-types — Shared data model for the lmchat streaming core
//!
//! This crate defines everything the other lmchat crates agree on:
//!
//! | Concern | Types |
//! |---------|-------|
//! | Identity | [`ConversationId`], [`MessageId`], [`StreamId`] |
//! | Conversation model | [`Role`], [`Message`], [`Conversation`] |
//! | Transport seam | [`ChatTransport`], [`ChatRequest`], [`ChatEvent`], [`ChatStream`] |
//! | Errors | [`TransportError`], [`SendError`] |
//!
//! The transport seam is deliberately small: a backend opens a streaming
//! chat completion, answers a reachability probe, and lists installed
//! models. Everything else (conversation state, supersession, failure
//! notices) lives above the seam in `lmchat-session`.

#![deny(missing_docs)]

pub mod error;
pub mod id;
pub mod message;
pub mod transport;

pub use error::*;
pub use id::*;
pub use message::*;
pub use transport::*;
