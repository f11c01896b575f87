//! Turns upstream responses into user-facing text.
//!
//! The code detection here is a keyword heuristic, not a markdown parser:
//! if the text looks like it contains code, unbalanced fences are closed and
//! untagged opening fences are labelled `text`.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;

use crate::client::UpstreamResponse;
use crate::request::{ModelVariant, QueryRequest};

/// Header placed before every successful response.
pub const RESPONSE_HEADER: &str = "## GPT-5 Response\n\n";
/// Header placed before every error response.
pub const ERROR_HEADER: &str = "## Error\n\n";
/// Text used when the model returned nothing.
pub const EMPTY_RESPONSE: &str = "No response generated.";
/// Fingerprint recorded on error responses.
pub const ERROR_FINGERPRINT: &str = "error";

/// Case-insensitive substrings that mark a response as containing code.
const CODE_MARKERS: &[&str] = &[
    "```", "function ", "class ", "import ", "const ", "let ", "var ", "def ", "public ",
    "private ", "#include", "select ", "from ",
];

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("```").unwrap_or_else(|_| unreachable!()));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n){3,}").unwrap_or_else(|_| unreachable!()));

/// Metadata attached to every [`QueryResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseMetadata {
    /// Model the request targeted.
    pub model: ModelVariant,
    /// Total tokens reported by the API.
    pub tokens_used: u32,
    /// Model build fingerprint, or `"error"`.
    pub fingerprint: String,
    /// When the response was formatted (RFC 3339).
    pub timestamp: String,
    /// Wall-clock time spent on the call.
    pub processing_time_ms: u64,
}

/// Final response handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResponse {
    /// Display text.
    pub content: String,
    /// Call metadata.
    pub metadata: ResponseMetadata,
    /// Set when `content` describes a failure.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

/// Builds [`QueryResponse`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFormatter;

impl ResponseFormatter {
    /// Creates a formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Formats a successful upstream response.
    #[must_use]
    pub fn format(
        &self,
        response: &UpstreamResponse,
        request: &QueryRequest,
        elapsed: Duration,
    ) -> QueryResponse {
        QueryResponse {
            content: format!("{RESPONSE_HEADER}{}", format_text(&response.text)),
            metadata: ResponseMetadata {
                model: request.model,
                tokens_used: response.usage.total_tokens,
                fingerprint: response.fingerprint.clone(),
                timestamp: timestamp(Utc::now()),
                processing_time_ms: millis(elapsed),
            },
            is_error: false,
        }
    }

    /// Formats a failure. Falls back to the default model when the request
    /// never validated.
    #[must_use]
    pub fn create_error_response(
        &self,
        error: &dyn std::fmt::Display,
        request: Option<&QueryRequest>,
    ) -> QueryResponse {
        QueryResponse {
            content: format!("{ERROR_HEADER}**Failed to process request:** {error}"),
            metadata: ResponseMetadata {
                model: request.map(|r| r.model).unwrap_or_default(),
                tokens_used: 0,
                fingerprint: ERROR_FINGERPRINT.to_string(),
                timestamp: timestamp(Utc::now()),
                processing_time_ms: 0,
            },
            is_error: true,
        }
    }
}

/// Applies placeholder, fence repair and newline collapsing to raw text.
#[must_use]
pub fn format_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return EMPTY_RESPONSE.to_string();
    }

    let text = if contains_code(trimmed) {
        repair_fences(trimmed)
    } else {
        trimmed.to_string()
    };

    EXCESS_NEWLINES.replace_all(&text, "\n\n").into_owned()
}

/// Returns `true` if `text` matches any code marker (case-insensitive).
#[must_use]
pub fn contains_code(text: &str) -> bool {
    let lower = text.to_lowercase();
    CODE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Closes an unbalanced fence and tags untagged opening fences as `text`.
#[must_use]
pub fn repair_fences(text: &str) -> String {
    let mut balanced = text.to_string();
    if FENCE.find_iter(text).count() % 2 == 1 {
        balanced.push_str("\n```");
    }

    let mut out = String::with_capacity(balanced.len() + 16);
    let mut last = 0;
    for (i, fence) in FENCE.find_iter(&balanced).enumerate() {
        out.push_str(&balanced[last..fence.end()]);
        last = fence.end();
        let tagged = balanced[last..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '+' | '#' | '-' | '_'));
        if i % 2 == 0 && !tagged {
            out.push_str("text");
        }
    }
    out.push_str(&balanced[last..]);
    out
}

/// Text returned by `test_connection` on success.
#[must_use]
pub fn connection_success_text(at: DateTime<Utc>) -> String {
    format!(
        "Connection to OpenAI API successful.\n\nAvailable models: {}\nTimestamp: {}",
        ModelVariant::names(),
        timestamp(at)
    )
}

/// Text returned by `test_connection` on failure.
#[must_use]
pub fn connection_failure_text() -> String {
    "Connection to OpenAI API failed.\n\nPossible causes:\n\
     - Invalid or expired API key\n\
     - Network connectivity issues\n\
     - OpenAI API service outage"
        .to_string()
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
