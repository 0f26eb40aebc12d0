//! Error types shared across the lmchat crates.

use std::time::Duration;

use crate::id::ConversationId;

/// Errors from the chat transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    // Retryable errors
    /// Network-level error (connection refused, DNS failure, reset
    /// mid-body, TLS trouble).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Request timed out.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // Terminal errors
    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, or the reason phrase when the body was empty.
        message: String,
    },
    /// The server answered 2xx but the payload was not understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// Whether this error is likely transient and the request can be retried.
    ///
    /// Server-side statuses (5xx) count as retryable; client-side statuses
    /// and malformed payloads do not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::InvalidResponse(_) => false,
        }
    }
}

/// Why a send was rejected before any state changed.
///
/// These are precondition failures: when one is returned, no message was
/// appended and no stream was opened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The prompt was empty or whitespace-only.
    #[error("prompt is empty")]
    EmptyPrompt,
    /// No conversation with this id exists.
    #[error("unknown conversation: {0}")]
    UnknownConversation(ConversationId),
    /// No model has been selected yet.
    #[error("no model configured")]
    NoModelConfigured,
    /// The server has not been reached; run a connection check first.
    #[error("not connected to the model server")]
    NotConnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_timeout_are_retryable() {
        let network = TransportError::Network("refused".into());
        assert!(network.is_retryable());
        assert!(TransportError::Timeout(Duration::from_secs(5)).is_retryable());
    }

    #[test]
    fn server_statuses_are_retryable_client_statuses_are_not() {
        let server = TransportError::Status {
            status: 503,
            message: "overloaded".into(),
        };
        assert!(server.is_retryable());

        let client = TransportError::Status {
            status: 404,
            message: "model not found".into(),
        };
        assert!(!client.is_retryable());
    }

    #[test]
    fn invalid_response_is_terminal() {
        assert!(!TransportError::InvalidResponse("not json".into()).is_retryable());
    }

    #[test]
    fn status_display_includes_code_and_message() {
        let err = TransportError::Status {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn send_error_display() {
        assert_eq!(SendError::EmptyPrompt.to_string(), "prompt is empty");
        assert_eq!(
            SendError::UnknownConversation(ConversationId::new("c1")).to_string(),
            "unknown conversation: c1"
        );
    }
}
