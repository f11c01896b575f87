//! MCP tool parameter types.
//!
//! Defines the input schemas for MCP tools using `schemars` for automatic
//! JSON Schema generation required by the MCP protocol. Incoming arguments
//! are not deserialized through these types; the query pipeline validates
//! the raw JSON so it can clamp and fall back instead of rejecting.

use std::sync::Arc;

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::request::{ModelVariant, ReasoningEffort, Verbosity};

/// Parameters for the `query` MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryParams {
    /// The prompt to send to GPT-5.
    pub prompt: String,

    /// Additional context prepended to the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// GPT-5 model variant (default `gpt-5`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelVariant>,

    /// Response length and detail (default `medium`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,

    /// Reasoning depth (default `standard`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,

    /// Maximum output tokens (1-128000).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1, max = 128_000))]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0-2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0.0, max = 2.0))]
    pub temperature: Option<f32>,
}

/// JSON Schema for `T` as an MCP input schema object.
#[must_use]
pub fn input_schema<T: JsonSchema>() -> Arc<JsonObject> {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(schema) {
        Ok(serde_json::Value::Object(map)) => Arc::new(map),
        _ => Arc::new(empty_object_schema()),
    }
}

/// Schema for a tool that takes no arguments.
#[must_use]
pub fn empty_object_schema() -> JsonObject {
    let mut map = JsonObject::new();
    map.insert("type".to_string(), "object".into());
    map.insert("properties".to_string(), JsonObject::new().into());
    map
}
