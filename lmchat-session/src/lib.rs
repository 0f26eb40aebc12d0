//! Conversation and streaming state machine for lmchat.
//!
//! This crate provides:
//! - [`ChatSession`] — the conversation store and per-conversation stream
//!   driver over any [`ChatTransport`](lmchat_types::ChatTransport)
//! - [`SendOutcome`] — how a send ended (completed, failed, superseded)
//! - [`FAILURE_NOTICE`] — the fixed text a failed reply is replaced with
//!
//! A conversation has at most one in-flight reply. Sending again while a
//! reply streams supersedes it: the old placeholder keeps whatever partial
//! content it had, its streaming flag clears, and any increments still
//! arriving from the old stream are discarded. Deleting a conversation
//! mid-stream discards the rest of that reply silently.

pub mod session;

mod state;

pub use session::{ChatSession, FAILURE_NOTICE, SendOutcome};
