//! Untyped tool arguments → [`QueryRequest`].
//!
//! [`RequestValidator::validate`] is the only entry point from the RPC
//! boundary: it checks shape, sanitizes text, applies defaults and clamps
//! numeric options. [`truncate_if_needed`] then keeps the combined input
//! within the estimated token budget.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::model::{ModelVariant, QueryRequest, ReasoningEffort, Verbosity};
use crate::error::ValidationError;

/// Maximum characters kept from `prompt` or `context` after sanitization.
pub const MAX_TEXT_CHARS: usize = 100_000;
/// Lower bound for `max_tokens`.
pub const MIN_MAX_TOKENS: u32 = 1;
/// Upper bound for `max_tokens`.
pub const MAX_MAX_TOKENS: u32 = 128_000;
/// Lower bound for `temperature`.
pub const MIN_TEMPERATURE: f32 = 0.0;
/// Upper bound for `temperature`.
pub const MAX_TEMPERATURE: f32 = 2.0;
/// Estimated input token budget before truncation kicks in.
pub const MAX_INPUT_TOKENS: usize = 380_000;
/// Characters per token used by the local estimate.
pub const CHARS_PER_TOKEN: usize = 4;
/// Marker appended to truncated text.
pub const TRUNCATION_MARKER: &str = "\n\n...[truncated]";
/// Characters held back from the budget for the marker.
const MARKER_RESERVE: usize = 100;

/// Validates raw tool arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator {
    default_model: ModelVariant,
}

impl RequestValidator {
    /// Creates a validator that fills in `default_model` when none is given.
    #[must_use]
    pub const fn new(default_model: ModelVariant) -> Self {
        Self { default_model }
    }

    /// Converts untyped arguments into a [`QueryRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnObject`] if `raw` is not a JSON object
    /// and [`ValidationError::MissingPrompt`] if `prompt` is absent, not a
    /// string, or empty once sanitized.
    pub fn validate(&self, raw: &Value) -> Result<QueryRequest, ValidationError> {
        let args = raw.as_object().ok_or(ValidationError::NotAnObject)?;

        let prompt = args
            .get("prompt")
            .and_then(Value::as_str)
            .map(sanitize_text)
            .filter(|p| !p.is_empty())
            .ok_or(ValidationError::MissingPrompt)?;

        let context = args
            .get("context")
            .and_then(Value::as_str)
            .map(sanitize_text)
            .filter(|c| !c.is_empty());

        Ok(QueryRequest {
            prompt,
            context,
            model: enum_field(args, "model", ModelVariant::parse).unwrap_or(self.default_model),
            verbosity: enum_field(args, "verbosity", Verbosity::parse).unwrap_or_default(),
            reasoning_effort: enum_field(args, "reasoning_effort", ReasoningEffort::parse)
                .unwrap_or_default(),
            max_tokens: args.get("max_tokens").and_then(Value::as_f64).map(clamp_max_tokens),
            temperature: args
                .get("temperature")
                .and_then(Value::as_f64)
                .map(clamp_temperature),
        })
    }
}

/// Reads an optional enumerated string field, ignoring unknown values.
fn enum_field<T>(args: &Map<String, Value>, key: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
    let raw = args.get(key)?.as_str()?;
    let parsed = parse(raw);
    if parsed.is_none() {
        debug!(field = key, value = raw, "unrecognized value, using default");
    }
    parsed
}

/// Clamps a requested output token limit into `[1, 128000]`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn clamp_max_tokens(value: f64) -> u32 {
    value
        .trunc()
        .clamp(f64::from(MIN_MAX_TOKENS), f64::from(MAX_MAX_TOKENS)) as u32
}

/// Clamps a requested temperature into `[0, 2]`.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn clamp_temperature(value: f64) -> f32 {
    value.clamp(f64::from(MIN_TEMPERATURE), f64::from(MAX_TEMPERATURE)) as f32
}

/// Strips control characters, caps the length and trims whitespace.
///
/// Tabs, newlines and carriage returns survive; every other control
/// character (including NUL) is removed. Applying this twice yields the same
/// result as applying it once.
#[must_use]
pub fn sanitize_text(input: &str) -> String {
    let capped: String = input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .take(MAX_TEXT_CHARS)
        .collect();
    capped.trim().to_string()
}

/// Estimates tokens for `prompt` plus `context` at four characters per token.
#[must_use]
pub fn estimate_tokens(request: &QueryRequest) -> usize {
    let chars = request.prompt.chars().count()
        + request.context.as_deref().map_or(0, |c| c.chars().count());
    chars.div_ceil(CHARS_PER_TOKEN)
}

/// Shrinks oversized input to fit [`MAX_INPUT_TOKENS`].
///
/// Context is cut first; the prompt is only cut if it alone exceeds the
/// budget. Truncated text ends with [`TRUNCATION_MARKER`]. When no room is
/// left for any context, it is dropped and the prompt ends with the marker.
#[must_use]
pub fn truncate_if_needed(mut request: QueryRequest) -> QueryRequest {
    let before = estimate_tokens(&request);
    if before <= MAX_INPUT_TOKENS {
        return request;
    }

    let budget = MAX_INPUT_TOKENS * CHARS_PER_TOKEN;
    let prompt_chars = request.prompt.chars().count();

    let mut context_dropped = false;
    if let Some(context) = request.context.take() {
        let remaining = budget.saturating_sub(prompt_chars);
        let context_chars = context.chars().count();
        request.context = if context_chars <= remaining {
            Some(context)
        } else if remaining > MARKER_RESERVE {
            Some(cut(&context, remaining - MARKER_RESERVE))
        } else {
            context_dropped = true;
            None
        };
    }

    // A dropped context still has to show up as a marker, so the prompt
    // carries it.
    let context_chars = request.context.as_deref().map_or(0, |c| c.chars().count());
    if context_dropped || prompt_chars + context_chars > budget {
        let keep = budget
            .saturating_sub(context_chars + MARKER_RESERVE)
            .min(prompt_chars);
        request.prompt = cut(&request.prompt, keep);
    }

    warn!(
        estimated_tokens = before,
        truncated_tokens = estimate_tokens(&request),
        limit = MAX_INPUT_TOKENS,
        "input exceeds token budget, truncated"
    );
    request
}

fn cut(text: &str, keep_chars: usize) -> String {
    let mut out: String = text.chars().take(keep_chars).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
