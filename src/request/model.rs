//! Validated query request and its enumerated options.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// GPT-5 model variants accepted by the `query` tool.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum ModelVariant {
    /// Full GPT-5.
    #[default]
    #[serde(rename = "gpt-5")]
    Gpt5,
    /// Smaller, cheaper GPT-5.
    #[serde(rename = "gpt-5-mini")]
    Gpt5Mini,
    /// Smallest GPT-5, used for connection checks.
    #[serde(rename = "gpt-5-nano")]
    Gpt5Nano,
}

impl ModelVariant {
    /// Every variant, largest first.
    pub const ALL: [Self; 3] = [Self::Gpt5, Self::Gpt5Mini, Self::Gpt5Nano];

    /// Parses an exact model name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    /// Returns the upstream model identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt5 => "gpt-5",
            Self::Gpt5Mini => "gpt-5-mini",
            Self::Gpt5Nano => "gpt-5-nano",
        }
    }

    /// Returns all model names joined with `", "`.
    #[must_use]
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(Self::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested response length and detail.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Short answers.
    Low,
    /// Balanced answers.
    #[default]
    Medium,
    /// Detailed answers.
    High,
}

impl Verbosity {
    /// Parses a verbosity name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Requested depth of reasoning.
///
/// The caller-facing names differ from the upstream API values; see
/// [`upstream_value`](ReasoningEffort::upstream_value).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    /// Answer with as little reasoning as possible.
    Minimal,
    /// Default reasoning depth.
    #[default]
    Standard,
    /// Thorough multi-step reasoning.
    Extended,
}

impl ReasoningEffort {
    /// Parses a reasoning effort name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "standard" => Some(Self::Standard),
            "extended" => Some(Self::Extended),
            _ => None,
        }
    }

    /// Returns the caller-facing name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }

    /// Returns the value sent as `reasoning_effort` to the chat completions API.
    #[must_use]
    pub const fn upstream_value(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Standard => "medium",
            Self::Extended => "high",
        }
    }
}

/// A validated and sanitized query.
///
/// Only produced by [`RequestValidator::validate`](super::RequestValidator::validate)
/// (or by hand in tests); `prompt` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    /// Primary instruction.
    pub prompt: String,
    /// Supplementary text placed before the prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Target model.
    pub model: ModelVariant,
    /// Response verbosity.
    pub verbosity: Verbosity,
    /// Reasoning depth.
    pub reasoning_effort: ReasoningEffort,
    /// Output token limit, within `[1, 128000]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature, within `[0, 2]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl QueryRequest {
    /// Creates a request with default options.
    #[must_use]
    pub fn new(prompt: impl Into<String>, model: ModelVariant) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
            model,
            verbosity: Verbosity::default(),
            reasoning_effort: ReasoningEffort::default(),
            max_tokens: None,
            temperature: None,
        }
    }
}
