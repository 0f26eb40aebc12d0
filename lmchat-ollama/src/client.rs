//! Ollama API client struct and builder.

use std::future::Future;
use std::time::Duration;

use lmchat_types::{ChatRequest, ChatStream, ChatTransport, ModelInfo, TransportError};

use crate::error::{map_http_status, map_reqwest_error};
use crate::streaming::stream_from_response;
use crate::wire::{ChatBody, TagsResponse};

/// Default Ollama API base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default timeout for the reachability probe.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for a local Ollama server.
///
/// Implements [`ChatTransport`] for use anywhere a chat backend is
/// accepted. No authentication required (Ollama is local).
///
/// # Example
///
/// ```no_run
/// use lmchat_ollama::Ollama;
///
/// let transport = Ollama::new()
///     .base_url("http://localhost:11434");
/// ```
pub struct Ollama {
    /// API base URL (override for testing or remote Ollama instances).
    pub(crate) base_url: String,
    /// Timeout applied to the reachability probe only; chat streams run
    /// unbounded since generation can legitimately take minutes.
    pub(crate) probe_timeout: Duration,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl Ollama {
    /// Create a new client with defaults: base URL `http://localhost:11434`,
    /// probe timeout 5 seconds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the reachability-probe timeout.
    #[must_use]
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Build the chat endpoint URL.
    pub(crate) fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// Build the version endpoint URL (reachability probe).
    pub(crate) fn version_url(&self) -> String {
        format!("{}/api/version", self.base_url)
    }

    /// Build the tags endpoint URL (installed models).
    pub(crate) fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }
}

impl Default for Ollama {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatTransport for Ollama {
    /// Open a streaming chat completion against `POST /api/chat`.
    ///
    /// The body always carries `stream: true` and `think: false`. A
    /// non-success status is read to completion and mapped to
    /// [`TransportError::Status`]; otherwise the response body is handed
    /// to the NDJSON decoder.
    fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ChatStream, TransportError>> + Send {
        let url = self.chat_url();
        let http_client = self.client.clone();

        async move {
            let body = ChatBody {
                model: &request.model,
                messages: &request.messages,
                stream: true,
                think: false,
                options: request.options,
            };

            tracing::debug!(url = %url, model = %request.model, "opening chat stream");

            let response = http_client
                .post(&url)
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = response.status();
            if !status.is_success() {
                let body_text = response.text().await.map_err(map_reqwest_error)?;
                return Err(map_http_status(status, &body_text));
            }

            Ok(stream_from_response(response))
        }
    }

    /// Probe `GET /api/version` with the probe timeout.
    ///
    /// `true` iff the server answered HTTP 200. Never errors; an
    /// unreachable server is simply `false`.
    fn check_connection(&self) -> impl Future<Output = bool> + Send {
        let url = self.version_url();
        let http_client = self.client.clone();
        let timeout = self.probe_timeout;

        async move {
            match http_client.get(&url).timeout(timeout).send().await {
                Ok(response) => {
                    let reachable = response.status() == reqwest::StatusCode::OK;
                    tracing::debug!(url = %url, reachable, "connection probe");
                    reachable
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "connection probe failed");
                    false
                }
            }
        }
    }

    /// List installed models from `GET /api/tags`.
    fn list_models(&self) -> impl Future<Output = Result<Vec<ModelInfo>, TransportError>> + Send {
        let url = self.tags_url();
        let http_client = self.client.clone();

        async move {
            tracing::debug!(url = %url, "listing installed models");

            let response = http_client
                .get(&url)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = response.status();
            let text = response.text().await.map_err(map_reqwest_error)?;
            if !status.is_success() {
                return Err(map_http_status(status, &text));
            }

            let tags: TagsResponse = serde_json::from_str(&text)
                .map_err(|e| TransportError::InvalidResponse(format!("tags payload: {e}")))?;
            Ok(tags.models)
        }
    }
}
