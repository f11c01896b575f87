//! Maps validated queries onto upstream calls.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::backend::ChatBackend;
use super::message::{UpstreamRequest, UpstreamResponse, user_message};
use super::openai::OpenAiBackend;
use crate::config::ServerConfig;
use crate::error::ClientError;
use crate::request::{ModelVariant, QueryRequest, ReasoningEffort, Verbosity};

/// Characters of response text included in response logs.
const RESPONSE_PREVIEW_CHARS: usize = 500;
/// Prompt sent by [`UpstreamClient::test_connection`].
const PING_PROMPT: &str = "Hello";
/// Output token cap for the connection check.
const PING_MAX_TOKENS: u32 = 10;

/// Upstream client adapter.
///
/// Cheap to clone; the backend is shared.
#[derive(Clone)]
pub struct UpstreamClient {
    backend: Arc<dyn ChatBackend>,
    log_requests: bool,
    log_responses: bool,
}

impl UpstreamClient {
    /// Creates a client backed by the `OpenAI` API.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingApiKey`] if the configuration carries no
    /// API key, or [`ClientError::HttpClient`] if the HTTP client cannot be
    /// built. Both are fatal at startup.
    pub fn new(config: &ServerConfig) -> Result<Self, ClientError> {
        let backend = OpenAiBackend::new(config)?;
        Ok(Self::with_backend(Arc::new(backend), config))
    }

    /// Creates a client over an arbitrary backend.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn ChatBackend>, config: &ServerConfig) -> Self {
        Self {
            backend,
            log_requests: config.log_requests,
            log_responses: config.log_responses,
        }
    }

    /// Builds the upstream request body for a validated query.
    #[must_use]
    pub fn build_request(request: &QueryRequest) -> UpstreamRequest {
        let content = match request.context {
            Some(ref context) => format!("Context: {context}\n\nRequest: {}", request.prompt),
            None => request.prompt.clone(),
        };

        UpstreamRequest {
            model: request.model.as_str().to_string(),
            messages: vec![user_message(content)],
            verbosity: request.verbosity,
            reasoning_effort: request.reasoning_effort.upstream_value(),
            max_completion_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Sends a validated query upstream.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] if the API rejected the call and
    /// [`ClientError::Unexpected`] for any other failure.
    pub async fn query(&self, request: &QueryRequest) -> Result<UpstreamResponse, ClientError> {
        let upstream = Self::build_request(request);

        if self.log_requests {
            let payload = serde_json::to_string(&upstream).unwrap_or_default();
            info!(backend = self.backend.name(), %payload, "outbound request");
        }

        let response = self.backend.complete(&upstream).await?;

        if self.log_responses {
            info!(
                total_tokens = response.usage.total_tokens,
                fingerprint = %response.fingerprint,
                preview = %preview(&response.text, RESPONSE_PREVIEW_CHARS),
                "inbound response"
            );
        }

        Ok(response)
    }

    /// Sends a minimal request and reports whether it succeeded.
    ///
    /// Never fails; errors are logged and reported as `false`.
    pub async fn test_connection(&self) -> bool {
        let mut ping = QueryRequest::new(PING_PROMPT, ModelVariant::Gpt5Nano);
        ping.verbosity = Verbosity::Low;
        ping.reasoning_effort = ReasoningEffort::Minimal;
        ping.max_tokens = Some(PING_MAX_TOKENS);

        match self.query(&ping).await {
            Ok(response) => {
                debug!(fingerprint = %response.fingerprint, "connection check succeeded");
                true
            }
            Err(e) => {
                warn!(error = %e, "connection check failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("backend", &self.backend.name())
            .field("log_requests", &self.log_requests)
            .field("log_responses", &self.log_responses)
            .finish()
    }
}

/// Truncates a string to `max_len` characters, appending `...` when cut.
fn preview(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let mut out: String = s.chars().take(max_len - 3).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::message::TokenUsage;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Backend that records requests and replays a canned result.
    pub(crate) struct MockBackend {
        pub(crate) result: Result<UpstreamResponse, String>,
        pub(crate) seen: Mutex<Vec<UpstreamRequest>>,
    }

    impl MockBackend {
        pub(crate) fn replying(text: &str, total_tokens: u32) -> Self {
            Self {
                result: Ok(UpstreamResponse {
                    text: text.to_string(),
                    usage: TokenUsage {
                        prompt_tokens: 1,
                        completion_tokens: total_tokens.saturating_sub(1),
                        total_tokens,
                    },
                    fingerprint: "fp_test".to_string(),
                    created: Utc::now(),
                }),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn complete(
            &self,
            request: &UpstreamRequest,
        ) -> Result<UpstreamResponse, ClientError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            self.result.clone().map_err(|message| ClientError::Api {
                message,
                status: Some(500),
                code: None,
            })
        }
    }

    pub(crate) fn test_config() -> ServerConfig {
        ServerConfig::builder()
            .api_key("sk-test")
            .log_requests(true)
            .log_responses(true)
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_build_request_prompt_only() {
        let req = QueryRequest::new("Hello", ModelVariant::Gpt5);
        let built = UpstreamClient::build_request(&req);
        assert_eq!(built.model, "gpt-5");
        assert_eq!(built.messages.len(), 1);
        assert_eq!(built.messages[0].content, "Hello");
        assert_eq!(built.verbosity, Verbosity::Medium);
        assert_eq!(built.reasoning_effort, "medium");
        assert!(built.max_completion_tokens.is_none());
        assert!(built.temperature.is_none());
    }

    #[test]
    fn test_build_request_with_context_and_limits() {
        let mut req = QueryRequest::new("Summarize", ModelVariant::Gpt5Mini);
        req.context = Some("Some document".to_string());
        req.max_tokens = Some(256);
        req.temperature = Some(0.2);
        req.reasoning_effort = ReasoningEffort::Extended;

        let built = UpstreamClient::build_request(&req);
        assert_eq!(
            built.messages[0].content,
            "Context: Some document\n\nRequest: Summarize"
        );
        assert_eq!(built.model, "gpt-5-mini");
        assert_eq!(built.max_completion_tokens, Some(256));
        assert_eq!(built.temperature, Some(0.2));
        assert_eq!(built.reasoning_effort, "high");
    }

    #[test]
    fn test_missing_key_fails_construction() {
        let config = ServerConfig {
            api_key: String::new(),
            ..test_config()
        };
        let err = UpstreamClient::new(&config).unwrap_err();
        assert!(matches!(err, ClientError::MissingApiKey));
        assert_eq!(err.to_string(), "OpenAI API key is required");
    }

    #[tokio::test]
    async fn test_query_passes_through_response() {
        let backend = Arc::new(MockBackend::replying("Hi!", 12));
        let client = UpstreamClient::with_backend(backend.clone(), &test_config());

        let response = client
            .query(&QueryRequest::new("Hello", ModelVariant::Gpt5))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(response.text, "Hi!");
        assert_eq!(response.usage.total_tokens, 12);

        let seen = backend.seen.lock().map(|s| s.len()).unwrap_or_default();
        assert_eq!(seen, 1);
    }

    #[tokio::test]
    async fn test_query_propagates_api_error() {
        let client = UpstreamClient::with_backend(
            Arc::new(MockBackend::failing("server exploded")),
            &test_config(),
        );
        let err = client
            .query(&QueryRequest::new("Hello", ModelVariant::Gpt5))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: Some(500), .. }));
    }

    #[tokio::test]
    async fn test_connection_success_uses_minimal_request() {
        let backend = Arc::new(MockBackend::replying("Hi", 3));
        let client = UpstreamClient::with_backend(backend.clone(), &test_config());
        assert!(client.test_connection().await);

        let seen = backend.seen.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gpt-5-nano");
        assert_eq!(seen[0].verbosity, Verbosity::Low);
        assert_eq!(seen[0].reasoning_effort, "minimal");
        assert_eq!(seen[0].max_completion_tokens, Some(PING_MAX_TOKENS));
    }

    #[tokio::test]
    async fn test_connection_failure_returns_false() {
        let client = UpstreamClient::with_backend(
            Arc::new(MockBackend::failing("unreachable")),
            &test_config(),
        );
        assert!(!client.test_connection().await);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("hello", 10), "hello");
        assert_eq!(preview("hello", 5), "hello");
        assert_eq!(preview("hello world", 8), "hello...");
        assert_eq!(preview("hello", 3), "hel");
    }
}
