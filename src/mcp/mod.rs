//! MCP (Model Context Protocol) server for gpt5-mcp.
//!
//! # Architecture
//!
//! ```text
//! MCP Client
//!   ↓ tools/call query {prompt, ...}
//! Gpt5McpServer::dispatch
//!   ↓
//! QueryPipeline::run
//!   ├── RequestValidator + truncation
//!   ├── UpstreamClient → OpenAI chat completions
//!   └── ResponseFormatter
//!   ↓
//! Markdown text → MCP Client
//! ```
//!
//! # Feature Gate
//!
//! The streamable HTTP transport requires the `http` feature (on by default).
//! Stdio is always available.

pub mod params;
pub mod server;
pub mod transport;

pub use params::QueryParams;
pub use server::Gpt5McpServer;
#[cfg(feature = "http")]
pub use transport::serve_http;
pub use transport::serve_stdio;
