//! Upstream client adapter for the `OpenAI` chat completions API.
//!
//! # Architecture
//!
//! ```text
//! QueryRequest
//!   ↓ UpstreamClient::build_request
//! UpstreamRequest (serde body)
//!   ↓ ChatBackend::complete (OpenAiBackend → reqwest POST /chat/completions)
//! RawCompletion → UpstreamResponse
//! ```

pub mod adapter;
pub mod backend;
pub mod message;
pub mod openai;

pub use adapter::UpstreamClient;
pub use backend::ChatBackend;
pub use message::{ChatMessage, Role, TokenUsage, UpstreamRequest, UpstreamResponse};
pub use openai::OpenAiBackend;
