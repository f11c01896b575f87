//! Wire types for the chat completions endpoint.
//!
//! [`UpstreamRequest`] serializes directly as the request body, and
//! [`RawCompletion`] deserializes the response leniently: every field the
//! adapter reads is optional so that partial or proxy-modified responses
//! still map onto an [`UpstreamResponse`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::Verbosity;

/// Role of a chat message participant. Only user turns are ever sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input.
    User,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Message content.
    pub content: String,
}

/// Creates a user message.
#[must_use]
pub fn user_message(content: impl Into<String>) -> ChatMessage {
    ChatMessage {
        role: Role::User,
        content: content.into(),
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages (a single user message in practice).
    pub messages: Vec<ChatMessage>,
    /// GPT-5 output verbosity.
    pub verbosity: Verbosity,
    /// Upstream reasoning effort value (`minimal`, `medium`, `high`).
    pub reasoning_effort: &'static str,
    /// Output token limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Token usage statistics from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// A completed upstream call, reduced to what the formatter needs.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    /// Generated text; empty when the model returned nothing.
    pub text: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// `system_fingerprint` of the serving model build; may be empty.
    pub fingerprint: String,
    /// Creation time reported by the API, or the receive time.
    pub created: DateTime<Utc>,
}

/// Raw chat completion response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCompletion {
    /// Completion choices.
    pub choices: Vec<RawChoice>,
    /// Token usage.
    pub usage: Option<TokenUsage>,
    /// Model build fingerprint.
    pub system_fingerprint: Option<String>,
    /// Unix timestamp (seconds).
    pub created: Option<i64>,
}

/// A single completion choice.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawChoice {
    /// The generated message.
    pub message: Option<RawMessage>,
}

/// Message body of a choice.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMessage {
    /// Text content.
    pub content: Option<String>,
}

impl From<RawCompletion> for UpstreamResponse {
    fn from(raw: RawCompletion) -> Self {
        let text = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        let created = raw
            .created
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        Self {
            text,
            usage: raw.usage.unwrap_or_default(),
            fingerprint: raw.system_fingerprint.unwrap_or_default(),
            created,
        }
    }
}
