//! End-to-end query handling: validate, truncate, call upstream, format.
//!
//! Every failure past this point is folded into a [`QueryResponse`] with
//! `is_error` set, so callers only ever see formatted text.

use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::client::UpstreamClient;
use crate::config::ServerConfig;
use crate::format::{
    QueryResponse, ResponseFormatter, connection_failure_text, connection_success_text,
};
use crate::request::{RequestValidator, truncate_if_needed};

/// Outcome of a connectivity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    /// Whether the connection check succeeded.
    pub ok: bool,
    /// Human-readable summary.
    pub text: String,
}

/// Validator, upstream client and formatter wired together.
#[derive(Debug, Clone)]
pub struct QueryPipeline {
    validator: RequestValidator,
    client: UpstreamClient,
    formatter: ResponseFormatter,
}

impl QueryPipeline {
    /// Creates a pipeline using the configured default model.
    #[must_use]
    pub fn new(config: &ServerConfig, client: UpstreamClient) -> Self {
        Self {
            validator: RequestValidator::new(config.default_model),
            client,
            formatter: ResponseFormatter::new(),
        }
    }

    /// Returns the upstream client.
    #[must_use]
    pub const fn client(&self) -> &UpstreamClient {
        &self.client
    }

    /// Runs one query from raw tool arguments.
    pub async fn run(&self, raw: &Value) -> QueryResponse {
        let request = match self.validator.validate(raw) {
            Ok(request) => truncate_if_needed(request),
            Err(e) => {
                debug!(error = %e, "rejected query arguments");
                return self.formatter.create_error_response(&e, None);
            }
        };

        info!(
            model = %request.model,
            verbosity = request.verbosity.as_str(),
            reasoning_effort = request.reasoning_effort.as_str(),
            prompt_chars = request.prompt.chars().count(),
            has_context = request.context.is_some(),
            "processing query"
        );

        let started = Instant::now();
        match self.client.query(&request).await {
            Ok(response) => {
                let formatted = self.formatter.format(&response, &request, started.elapsed());
                info!(
                    model = %formatted.metadata.model,
                    tokens_used = formatted.metadata.tokens_used,
                    processing_time_ms = formatted.metadata.processing_time_ms,
                    "query completed"
                );
                formatted
            }
            Err(e) => {
                error!(error = %e, model = %request.model, "query failed");
                self.formatter.create_error_response(&e, Some(&request))
            }
        }
    }

    /// Checks the upstream API and describes the result.
    pub async fn check_connection(&self) -> ConnectionReport {
        let ok = self.client.test_connection().await;
        let text = if ok {
            connection_success_text(Utc::now())
        } else {
            connection_failure_text()
        };
        ConnectionReport { ok, text }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::client::adapter::tests::{MockBackend, test_config};
    use crate::format::{ERROR_HEADER, RESPONSE_HEADER};
    use crate::request::ModelVariant;

    fn pipeline(backend: Arc<MockBackend>) -> QueryPipeline {
        let config = test_config();
        QueryPipeline::new(&config, UpstreamClient::with_backend(backend, &config))
    }

    #[tokio::test]
    async fn test_run_success() {
        let backend = Arc::new(MockBackend::replying("Paris.", 42));
        let out = pipeline(backend.clone())
            .run(&json!({"prompt": "Capital of France?", "model": "gpt-5-mini"}))
            .await;

        assert!(!out.is_error);
        assert_eq!(out.content, format!("{RESPONSE_HEADER}Paris."));
        assert_eq!(out.metadata.model, ModelVariant::Gpt5Mini);
        assert_eq!(out.metadata.tokens_used, 42);
        assert_eq!(out.metadata.fingerprint, "fp_test");

        let seen = backend.seen.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].messages[0].content, "Capital of France?");
    }

    #[tokio::test]
    async fn test_run_not_an_object() {
        let backend = Arc::new(MockBackend::replying("unused", 1));
        let out = pipeline(backend.clone()).run(&json!("just a string")).await;

        assert!(out.is_error);
        assert_eq!(
            out.content,
            format!("{ERROR_HEADER}**Failed to process request:** Invalid request: must be an object")
        );
        assert_eq!(out.metadata.model, ModelVariant::Gpt5);
        assert!(backend.seen.lock().map(|s| s.is_empty()).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_run_missing_prompt() {
        let out = pipeline(Arc::new(MockBackend::replying("unused", 1)))
            .run(&json!({"prompt": 12}))
            .await;
        assert!(out.is_error);
        assert!(out.content.contains("prompt is required and must be a string"));
    }

    #[tokio::test]
    async fn test_run_upstream_failure() {
        let out = pipeline(Arc::new(MockBackend::failing("rate limited")))
            .run(&json!({"prompt": "Hi", "model": "gpt-5-nano"}))
            .await;

        assert!(out.is_error);
        assert!(out.content.starts_with(ERROR_HEADER));
        assert!(out.content.contains("rate limited"));
        assert_eq!(out.metadata.model, ModelVariant::Gpt5Nano);
        assert_eq!(out.metadata.tokens_used, 0);
        assert_eq!(out.metadata.fingerprint, "error");
    }

    #[tokio::test]
    async fn test_run_keeps_context_within_budget() {
        let backend = Arc::new(MockBackend::replying("ok", 1));
        let big = "a".repeat(100_000);
        let out = pipeline(backend.clone())
            .run(&json!({"prompt": "Summarize", "context": big}))
            .await;
        assert!(!out.is_error);

        // 100k chars is well under the input budget, so nothing is cut.
        let seen = backend.seen.lock().map(|s| s.clone()).unwrap_or_default();
        assert!(!seen[0].messages[0].content.contains("[truncated]"));
    }

    #[tokio::test]
    async fn test_check_connection() {
        let ok = pipeline(Arc::new(MockBackend::replying("Hi", 2)))
            .check_connection()
            .await;
        assert!(ok.ok);
        assert!(ok.text.contains("gpt-5-nano"));

        let failed = pipeline(Arc::new(MockBackend::failing("down")))
            .check_connection()
            .await;
        assert!(!failed.ok);
        assert!(failed.text.contains("Possible causes"));
    }
}
