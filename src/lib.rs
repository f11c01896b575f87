//! # gpt5-mcp
//!
//! An MCP (Model Context Protocol) server that forwards prompts to the
//! `OpenAI` GPT-5 chat completions API.
//!
//! Two tools are exposed:
//!
//! - `query`: validates and sanitizes the arguments, truncates oversized
//!   input, calls the API and returns the answer as markdown.
//! - `test_connection`: sends a minimal request and reports whether the API
//!   is reachable.
//!
//! ## Architecture
//!
//! - [`request`]: validated request types, sanitizer and truncation
//! - [`client`]: upstream request mapping and the `OpenAI` backend
//! - [`format`]: response formatting and the error response shape
//! - [`pipeline`]: validate → truncate → call → format
//! - [`mcp`]: rmcp server handler and transports
//! - [`config`]: environment and defaults-file configuration
//! - [`cli`]: command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod mcp;
pub mod pipeline;
pub mod request;

pub use client::UpstreamClient;
pub use config::{FileDefaults, LogLevel, ServerConfig};
pub use error::{ClientError, ConfigError, Error, Result, ValidationError};
pub use format::{QueryResponse, ResponseFormatter, ResponseMetadata};
pub use mcp::Gpt5McpServer;
pub use pipeline::QueryPipeline;
pub use request::{ModelVariant, QueryRequest, ReasoningEffort, RequestValidator, Verbosity};
