//! `OpenAI` backend.
//!
//! Supports any `OpenAI`-compatible API (`OpenAI`, Azure, local proxies)
//! via the base URL override in [`ServerConfig`]. `async-openai` supplies the
//! endpoint URL, auth headers and error body type; the POST itself goes
//! through our own `reqwest` client so one call is exactly one attempt and
//! the HTTP status of a failure is kept.

use async_openai::config::{Config, OpenAIConfig};
use async_openai::error::ApiError;
use async_trait::async_trait;
use serde::Deserialize;

use super::backend::ChatBackend;
use super::message::{RawCompletion, UpstreamRequest, UpstreamResponse};
use crate::config::ServerConfig;
use crate::error::ClientError;

/// Chat completions path, relative to the API base.
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// `OpenAI`-compatible chat backend.
pub struct OpenAiBackend {
    http: reqwest::Client,
    config: OpenAIConfig,
}

impl OpenAiBackend {
    /// Creates a backend from server configuration.
    ///
    /// The configured timeout bounds each call as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingApiKey`] for an empty key and
    /// [`ClientError::HttpClient`] if the HTTP client cannot be built.
    pub fn new(config: &ServerConfig) -> Result<Self, ClientError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::MissingApiKey);
        }

        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if let Some(ref base_url) = config.base_url {
            openai_config = openai_config.with_api_base(base_url.trim_end_matches('/'));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::HttpClient {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            config: openai_config,
        })
    }

    /// Full URL of the chat completions endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.config.url(CHAT_COMPLETIONS_PATH)
    }
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("endpoint", &self.endpoint())
            .finish_non_exhaustive()
    }
}

/// `{"error": {...}}` body returned by the API on failure.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// Builds the error for a non-success HTTP response.
fn api_error(status: reqwest::StatusCode, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => ClientError::Api {
            message: error.message,
            status: Some(status.as_u16()),
            code: error.code.as_ref().map(ToString::to_string),
        },
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            ClientError::Api {
                message: if text.is_empty() {
                    status.canonical_reason().unwrap_or("no response body").to_string()
                } else {
                    text
                },
                status: Some(status.as_u16()),
                code: None,
            }
        }
    }
}

fn transport_error(e: &reqwest::Error) -> ClientError {
    let message = if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    };
    ClientError::Unexpected { message }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, ClientError> {
        let response = self
            .http
            .post(self.endpoint())
            .headers(self.config.headers())
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport_error(&e))?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let raw: RawCompletion =
            serde_json::from_slice(&body).map_err(|e| ClientError::Unexpected {
                message: format!("malformed completion response: {e}"),
            })?;
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ModelVariant;
    use crate::request::QueryRequest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn config(key: &str) -> ServerConfig {
        ServerConfig::builder()
            .api_key("sk-test")
            .build()
            .map(|c| ServerConfig {
                api_key: key.to_string(),
                ..c
            })
            .unwrap_or_else(|_| unreachable!())
    }

    fn request() -> UpstreamRequest {
        crate::client::UpstreamClient::build_request(&QueryRequest::new(
            "Hello",
            ModelVariant::Gpt5Nano,
        ))
    }

    /// Reads one HTTP request (headers plus `Content-Length` body).
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let Ok(n) = stream.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    /// Serves a fixed response to every connection and counts requests.
    async fn serve(status_line: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|_| unreachable!());
        let addr = listener.local_addr().unwrap_or_else(|_| unreachable!());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                read_request(&mut stream).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (format!("http://{addr}/v1"), hits)
    }

    fn backend(base_url: &str) -> OpenAiBackend {
        let config = ServerConfig {
            base_url: Some(base_url.to_string()),
            ..config("sk-test")
        };
        OpenAiBackend::new(&config).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_new_requires_key() {
        let result = OpenAiBackend::new(&config(""));
        assert!(matches!(result, Err(ClientError::MissingApiKey)));
    }

    #[test]
    fn test_new_with_key() {
        let backend = OpenAiBackend::new(&config("sk-test"));
        assert!(backend.is_ok());
        assert_eq!(backend.map(|b| b.name()).unwrap_or_default(), "openai");
    }

    #[test]
    fn test_endpoint_uses_base_url() {
        let backend = backend("http://localhost:8080/v1/");
        assert_eq!(backend.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_api_error_from_body() {
        let body = br#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error", "param": null, "code": "invalid_api_key"}}"#;
        let err = api_error(reqwest::StatusCode::UNAUTHORIZED, body);
        assert_eq!(
            err.to_string(),
            "OpenAI API error (401, invalid_api_key): Incorrect API key provided"
        );
    }

    #[test]
    fn test_api_error_without_json_body() {
        let err = api_error(reqwest::StatusCode::BAD_GATEWAY, b"");
        assert_eq!(err.to_string(), "OpenAI API error (502): Bad Gateway");

        let err = api_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, b"upstream down");
        assert_eq!(err.to_string(), "OpenAI API error (500): upstream down");
    }

    #[tokio::test]
    async fn test_unauthorized_keeps_status() {
        let (base, hits) = serve(
            "401 Unauthorized",
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","param":null,"code":"invalid_api_key"}}"#,
        )
        .await;

        let err = backend(&base).complete(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: Some(401), .. }));
        assert!(err.to_string().starts_with("OpenAI API error (401, invalid_api_key)"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let (base, hits) = serve(
            "500 Internal Server Error",
            r#"{"error":{"message":"boom","type":"server_error","param":null,"code":null}}"#,
        )
        .await;

        let result =
            tokio::time::timeout(Duration::from_secs(5), backend(&base).complete(&request())).await;
        let err = result.unwrap_or_else(|_| unreachable!()).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: Some(500), .. }));
        assert_eq!(err.to_string(), "OpenAI API error (500): boom");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_decodes_completion() {
        let (base, hits) = serve(
            "200 OK",
            r#"{"id":"c1","object":"chat.completion","created":1700000000,"model":"gpt-5-nano","system_fingerprint":"fp_abc","choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"},"finish_reason":"stop"}],"usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}"#,
        )
        .await;

        let response = backend(&base)
            .complete(&request())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(response.text, "Hi!");
        assert_eq!(response.usage.total_tokens, 5);
        assert_eq!(response.fingerprint, "fp_abc");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unexpected() {
        let err = backend("http://127.0.0.1:9/v1")
            .complete(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unexpected { .. }));
    }
}
