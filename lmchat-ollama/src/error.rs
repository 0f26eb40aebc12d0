//! Internal helpers mapping HTTP/reqwest failures to [`TransportError`].

use std::time::Duration;

use lmchat_types::TransportError;

/// Map a non-success HTTP status and response body to a [`TransportError`].
///
/// Ollama reports problems as plain-text or JSON bodies; when the body is
/// empty the status reason phrase stands in.
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> TransportError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    } else {
        body.to_string()
    };
    TransportError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Map a [`reqwest::Error`] to a [`TransportError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(Duration::from_secs(30))
    } else {
        TransportError::Network(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_404_keeps_the_body() {
        let err = map_http_status(reqwest::StatusCode::NOT_FOUND, "model 'foo' not found");
        match err {
            TransportError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "model 'foo' not found");
            }
            other => panic!("expected Status, got: {other:?}"),
        }
    }

    #[test]
    fn status_500_is_retryable() {
        let err = map_http_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        assert!(err.is_retryable());
    }

    #[test]
    fn status_502_is_retryable() {
        let err = map_http_status(reqwest::StatusCode::BAD_GATEWAY, "bad gateway");
        assert!(err.is_retryable());
    }

    #[test]
    fn status_400_is_not_retryable() {
        let err = map_http_status(reqwest::StatusCode::BAD_REQUEST, "bad body");
        assert!(!err.is_retryable());
    }

    #[test]
    fn status_404_is_not_retryable() {
        let err = map_http_status(reqwest::StatusCode::NOT_FOUND, "not found");
        assert!(!err.is_retryable());
    }

    #[test]
    fn empty_body_falls_back_to_reason_phrase() {
        let err = map_http_status(reqwest::StatusCode::SERVICE_UNAVAILABLE, "");
        match err {
            TransportError::Status { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("expected Status, got: {other:?}"),
        }
    }

    #[test]
    fn whitespace_body_falls_back_to_reason_phrase() {
        let err = map_http_status(reqwest::StatusCode::BAD_REQUEST, "  \n");
        match err {
            TransportError::Status { message, .. } => assert_eq!(message, "Bad Request"),
            other => panic!("expected Status, got: {other:?}"),
        }
    }
}
